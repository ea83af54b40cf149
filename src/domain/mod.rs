// Calendar and seasonality
pub mod calendar;

// Demand factors
pub mod demand;

// Domain-specific error types
pub mod errors;

// Feature schemas, tasks and prediction types
pub mod ml;

pub mod numeric;

// Port interfaces
pub mod ports;

// Source and canonical booking records
pub mod records;

pub mod tiers;

// Weather suitability
pub mod weather;
