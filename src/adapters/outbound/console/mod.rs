/// Console adapters: log-backed notifications and scan output
mod log_notifier;
mod scan_presenter;

pub use log_notifier::TracingNotificationSink;
pub use scan_presenter::ScanPresenter;
