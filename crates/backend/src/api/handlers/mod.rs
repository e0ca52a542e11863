// Aggregate handlers
pub mod a001_product;

// UseCase handlers
pub mod u501_sync_from_winestro;
pub mod webhooks;

// System handlers
pub mod system_log;
