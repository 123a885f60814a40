pub mod backend;
pub mod checkout;
pub mod draft;
pub mod outcome;
pub mod pending;
pub mod ports;
pub mod subject;
