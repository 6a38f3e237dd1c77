use gemchat_core::storage::{HISTORY_KEY, KeyValueStore};
use gemchat_core::transcript::{Attachment, ConversationMessage, Transcript};
use gemchat_infrastructure::JsonFileStore;
use tempfile::TempDir;

fn sample_transcript() -> Transcript {
    let image = Attachment::with_payload("cat.png", vec![0x89, 0x50, 0x4e, 0x47], Some("image/png".into()));
    let mut transcript = Transcript::new();
    transcript.push(ConversationMessage::user("what is this?", vec![image]));
    transcript.push(ConversationMessage::assistant("A cat."));
    transcript
}

#[tokio::test]
async fn test_transcript_survives_store_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let transcript = sample_transcript();

    let store = JsonFileStore::new(path.clone());
    store
        .write(HISTORY_KEY, &transcript.to_json().unwrap())
        .await
        .unwrap();

    let reopened = JsonFileStore::new(path);
    let raw = reopened.read(HISTORY_KEY).await.unwrap().unwrap();
    let restored = Transcript::from_json(&raw).unwrap();

    assert_eq!(restored, transcript);
    let attachment = &restored.messages()[0].attachments[0];
    assert_eq!(attachment.payload.as_deref(), Some(&[0x89, 0x50, 0x4e, 0x47][..]));
    assert_eq!(attachment.size, Some(4));
}

#[tokio::test]
async fn test_stored_attachment_payload_is_base64() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("store.json"));

    store
        .write(HISTORY_KEY, &sample_transcript().to_json().unwrap())
        .await
        .unwrap();

    let raw = store.read(HISTORY_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let stored = &value[0]["attachments"][0];
    assert_eq!(stored["name"], "cat.png");
    assert_eq!(stored["type"], "image/png");
    assert_eq!(stored["data"], "iVBORw==");
}
