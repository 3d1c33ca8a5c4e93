pub mod application {
    pub mod context;
    pub mod usecases {
        pub mod create_webhook;
        pub mod delete_webhook;
        pub mod delivery_stats;
        pub mod enqueue_event;
        pub mod list_webhook_deliveries;
        pub mod list_webhooks;
        pub mod process_deliveries;
        pub mod set_webhook_active;
        pub mod test_webhook;
    }
}

pub mod config;

pub mod domain {
    pub mod entities {
        pub mod delivery;
        pub mod webhook;
    }
    pub mod services {
        pub mod signature;
    }
    pub mod value_objects {
        pub mod event_type;
        pub mod ids;
        pub mod secret;
        pub mod timestamps;
    }
    pub mod workflows {
        pub mod delivery_policy;
    }
}

pub mod infrastructure {
    pub mod db {
        pub mod database;
        pub mod dto;
        pub mod postgres;
        pub mod repositories;
        pub mod stores {
            pub mod webhook_delivery_store;
            pub mod webhook_store;
        }
    }
    pub mod outbound {
        pub mod webhook_client;
    }
}

pub mod interface {
    pub mod http;
}

pub mod observability;
