// Management API: registry, recipients, manual checks and reports

pub mod alerts;
pub mod certificates;
pub mod domains;
pub mod emails;
pub mod server;
