use std::sync::Arc;

use crate::core::app::{App, AppActionContext, AppInit};
use crate::core::message::Message;
use crate::core::route::Route;
use crate::core::storage::{KeyValueStore, MemoryStore};
use crate::ui::appearance::Appearance;

pub const TEST_CONTEXT: AppActionContext = AppActionContext {
    term_width: 80,
    term_height: 24,
};

pub fn create_test_app() -> App {
    create_test_app_with_store(Arc::new(MemoryStore::new()))
}

pub fn create_test_app_with_store(store: Arc<dyn KeyValueStore>) -> App {
    App::new(AppInit {
        store,
        system_appearance: Some(Appearance::Dark),
        model_override: None,
        initial_route: Route::Root,
    })
}

pub fn create_test_messages() -> Vec<Message> {
    vec![
        Message::user("Hello"),
        Message::assistant("Hi there!"),
        Message::user("How are you?"),
        Message::assistant("I'm doing well, thank you for asking!"),
    ]
}
