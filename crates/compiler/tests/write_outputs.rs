use bomref_compiler::{
    clean_documents, write_documents, DocumentCompiler, PipelineMetadata, Selection,
    DOCUMENT_SUFFIX,
};
use bomref_protocol::{Document, Entity};

fn metadata() -> PipelineMetadata {
    PipelineMetadata {
        entities: vec![
            Entity::Model {
                name: "net".to_string(),
                version: "1.0.0".to_string(),
            },
            Entity::Model {
                name: "net".to_string(),
                version: "1.1.0".to_string(),
            },
        ],
        relationships: Vec::new(),
        pipelines: Vec::new(),
    }
}

#[tokio::test]
async fn writes_one_parseable_file_per_document() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = metadata();
    let selection = Selection::all(&metadata);
    let docs = DocumentCompiler::new(&metadata).compile(&selection).unwrap();

    let written = write_documents(dir.path(), &docs).await.unwrap();
    assert_eq!(written.len(), 2);
    for path in &written {
        assert!(path.file_name().unwrap().to_string_lossy().ends_with(DOCUMENT_SUFFIX));
        let bytes = std::fs::read(path).unwrap();
        let parsed: Document = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.primary.name, "net");
    }
    // No temp files left behind.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn clean_removes_only_document_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = metadata();
    let selection = Selection::all(&metadata);
    let docs = DocumentCompiler::new(&metadata).compile(&selection).unwrap();
    write_documents(dir.path(), &docs).await.unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

    let removed = clean_documents(dir.path()).await.unwrap();
    assert_eq!(removed, 2);
    assert!(dir.path().join("notes.txt").exists());

    // Cleaning a missing directory is not an error.
    assert_eq!(clean_documents(&dir.path().join("missing")).await.unwrap(), 0);
}
