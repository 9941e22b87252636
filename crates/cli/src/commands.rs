use anyhow::Result;
use bomref_compiler::{
    clean_documents, write_documents, DocumentCompiler, MetadataSource, ScenarioFile, Selection,
};
use bomref_graph::{GraphSnapshot, Reconstructor, SnapshotStore};
use bomref_watch::{DocumentWatcher, DocumentWatcherConfig};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub async fn compile(scenario: &Path, context: Option<&str>, out: &Path) -> Result<()> {
    let metadata = ScenarioFile::new(scenario).load()?;
    let selection = match context {
        Some(name) => Selection::for_context(&metadata, name)?,
        None => Selection::all(&metadata),
    };
    let documents = DocumentCompiler::new(&metadata).compile(&selection)?;

    clean_documents(out).await?;
    let written = write_documents(out, &documents).await?;
    println!("wrote {} documents to {}", written.len(), out.display());
    Ok(())
}

pub async fn reconstruct(docs: &Path, out: Option<&Path>) -> Result<()> {
    let scan_root = docs.to_path_buf();
    let reconstruction =
        tokio::task::spawn_blocking(move || Reconstructor::new(scan_root).scan()).await??;
    let snapshot = GraphSnapshot::from_graph(&reconstruction.graph);

    if let Some(path) = out {
        write_snapshot(path, &snapshot).await?;
        println!(
            "wrote snapshot ({} nodes, {} edges) to {}",
            snapshot.node_count(),
            snapshot.edge_count(),
            path.display()
        );
    } else {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

pub async fn watch(docs: &Path, out: &Path) -> Result<()> {
    let store = Arc::new(SnapshotStore::new());
    let watcher = DocumentWatcher::start(docs, store.clone(), DocumentWatcherConfig::default())?;
    let mut updates = watcher.subscribe_updates();
    watcher.trigger("startup").await?;

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(update) if update.success => {
                        let snapshot = store.current();
                        write_snapshot(out, &snapshot).await?;
                        log::info!(
                            "snapshot generation {} ({} nodes, {} edges) written to {}",
                            snapshot.generation,
                            snapshot.node_count(),
                            snapshot.edge_count(),
                            out.display()
                        );
                    }
                    // A failed rebuild keeps the previous snapshot file.
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("skipped {skipped} rebuild updates");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}

async fn write_snapshot(path: &Path, snapshot: &GraphSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
