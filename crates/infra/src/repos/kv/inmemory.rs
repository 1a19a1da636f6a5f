use super::IKeyValueRepo;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct InMemoryKeyValueRepo {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueRepo {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl IKeyValueRepo for InMemoryKeyValueRepo {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
