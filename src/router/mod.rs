// Router module - route dispatch and classification
// This file wires the operator facade, the transaction classifier and the
// shared request validation

pub mod classifier;
pub mod operator;
pub mod validation;

pub use classifier::RouteClassifier;
pub use operator::Operator;
pub use validation::ValidationResult;
