//! Standard resource catalog for demos and tests.

use medigate_types::Resource;

/// The standard hospital resource set: clinical records and the team each
/// belongs to.
pub fn standard_resources() -> Vec<Resource> {
    vec![
        Resource::new(101u64, "EMR", "emergency"),
        Resource::new(102u64, "EMR", "surgery"),
        Resource::new(103u64, "Pharmacy Data", "pharmacy"),
        Resource::new(104u64, "Lab Results", "lab"),
        Resource::new(105u64, "Billing Data", "billing"),
        Resource::new(106u64, "Patient Record", "emergency"),
        Resource::new(107u64, "Surgery Data", "surgery"),
        Resource::new(108u64, "X-Ray Images", "radiology"),
        Resource::new(109u64, "Insurance Claims", "billing"),
        Resource::new(110u64, "Pharmacy Inventory", "pharmacy"),
    ]
}
