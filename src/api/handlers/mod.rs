pub mod campaigns;
pub mod donations;
pub mod payments;
pub mod root;
pub mod volunteers;
