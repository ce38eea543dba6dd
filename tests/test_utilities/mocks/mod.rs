/// Mock implementations for testing
mod mock_driver_port;
mod mock_inventory_provider;
mod mock_notification_sink;
mod mock_policy_backend;

pub use mock_driver_port::MockDriverPort;
pub use mock_inventory_provider::MockInventoryProvider;
pub use mock_notification_sink::MockNotificationSink;
pub use mock_policy_backend::MockPolicyBackend;
