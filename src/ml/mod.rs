pub mod dataset;
pub mod features;
pub mod forest;
pub mod persistence;
pub mod trainer;
pub mod validation;

pub use dataset::Dataset;
pub use features::{compute_features, Feature, FeatureError};
pub use forest::{HyperParameters, RandomForest};
pub use persistence::{JsonFileStore, ModelMetadata, ParameterStore, SledStore, StoreError};
pub use trainer::{ModelTrainer, SearchSettings, SearchSpace, TrainError};
