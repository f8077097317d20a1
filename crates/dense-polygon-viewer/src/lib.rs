//! Dense Polygon Viewer - Application Library
//!
//! Desktop front-end for `dense-polygon-lib`: a slippy map with a polygon
//! layer that is indexed in batches and redrawn with coverage culling.

mod app;

pub use app::DensePolygonViewerApp;
