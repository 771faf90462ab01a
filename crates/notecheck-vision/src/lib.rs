//! Vision module - model-backed and fallback currency classification

pub mod classifier;
pub mod model_gateway;
pub mod preprocess;

pub use classifier::{
    select_classifier, Classification, Classifier, ModelBackedClassifier, ScoreModel,
    StochasticFallbackClassifier,
};
pub use model_gateway::{LoadedModel, ModelGateway, ModelState};
