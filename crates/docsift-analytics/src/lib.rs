//! # docsift analytics
//!
//! Corpus-wide analytics recomputed from a repository snapshot on every call.
//!
//! ## Features
//!
//! - **Anomaly detection**: isolation forest over extracted text length
//! - **Statement clustering**: TF-IDF vectors grouped with k-means
//! - **Corpus summary**: document counts by content type and kind
//!
//! ## Example
//!
//! ```rust,no_run
//! use docsift_analytics::StatementClusterer;
//!
//! let statements = vec![
//!     "The password policy requires rotation.".to_string(),
//!     "Travel rule covers flights.".to_string(),
//! ];
//! let report = StatementClusterer::default().cluster(&statements).unwrap();
//! println!("{} clusters", report.cluster_count());
//! ```

pub mod anomaly;
pub mod clustering;
pub mod error;
pub mod kmeans;
pub mod service;
pub mod summary;
pub mod tfidf;

pub use anomaly::{AnomalyConfig, AnomalyDetector, IsolationForest, OutlierDetector, OutlierLabel};
pub use clustering::{ClusterConfig, StatementClusterer};
pub use error::{AnalyticsError, Result};
pub use kmeans::{Clusterer, KMeans};
pub use service::CorpusAnalytics;
pub use summary::summarize_corpus;
pub use tfidf::{TfidfVectorizer, Vectorizer};
