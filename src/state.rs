use crate::{
    config::RuntimeConfiguration,
    store::{SqlStudentStore, StudentStore},
};
use maud::{DOCTYPE, Markup, html};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct StudentFormState {
    config: RuntimeConfiguration,
    store: Arc<dyn StudentStore>,
}

impl StudentFormState {
    pub fn new(config: RuntimeConfiguration) -> Self {
        let store = SqlStudentStore::new(config.db_config());
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: RuntimeConfiguration, store: Arc<dyn StudentStore>) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &dyn StudentStore {
        self.store.as_ref()
    }

    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { (self.config.app_name()) }
                }
                body class="bg-gray-900 min-h-screen flex flex-col items-center justify-center text-white" {
                    (markup)
                }
            }
        }
    }
}
