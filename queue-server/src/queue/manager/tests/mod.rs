use super::*;
use crate::live::LiveStatusHub;
use crate::queue::estimator::DEFAULT_HISTORY_WINDOW;
use shared::models::ServiceType;



fn create_test_manager() -> QueueManager {
    create_test_manager_with_hub(LiveStatusHub::new(64))
}


fn create_test_manager_with_hub(hub: LiveStatusHub) -> QueueManager {
    let storage = QueueStorage::open_in_memory().unwrap();
    QueueManager::with_storage(storage, ServiceCatalog::standard(), hub, DEFAULT_HISTORY_WINDOW)
        .unwrap()
}


fn draft(name: &str, service_type: ServiceType) -> EntryDraft {
    EntryDraft {
        name: name.to_string(),
        phone: Some("555-0100".to_string()),
        email: None,
        party_size: 2,
        service_type,
        location: None,
    }
}


fn draft_at(name: &str, service_type: ServiceType, location: &str) -> EntryDraft {
    EntryDraft {
        location: Some(location.to_string()),
        ..draft(name, service_type)
    }
}


fn status(status: EntryStatus) -> EntryStatusUpdate {
    EntryStatusUpdate {
        status,
        notes: None,
    }
}


// ========================================================================
// Helper: create N waiting entries of one type, returns ids in order
// ========================================================================

fn fill_queue(manager: &QueueManager, service_type: ServiceType, count: usize) -> Vec<u64> {
    (0..count)
        .map(|i| {
            manager
                .create(draft(&format!("guest-{}", i), service_type))
                .unwrap()
                .entry
                .id
        })
        .collect()
}
