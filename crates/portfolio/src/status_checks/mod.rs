//! Legacy client ping log kept for the original site's status widget.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{StatusCheck, StatusCheckCreate};
pub use router::status_check_router;
pub use service::{
    StatusCheckError, StatusCheckService, STATUS_CHECKS_COLLECTION, STATUS_LIST_LIMIT,
};
