pub mod filters;
pub mod hit;
pub mod icons;
pub mod image_cache;
pub mod paint;
pub mod plan;
pub mod text;

pub use filters::{BitmapCache, FilterOp, filter_ops};
pub use hit::{hit_test, hit_test_rect};
pub use icons::{IconLibrary, IconName, ResolvedIcon};
pub use image_cache::{
    CacheStats, ImageCache, ImageCacheConfig, ImageFetcher, ImageHandle, ImageLoadError,
    ImageState, Raster,
};
pub use paint::Painter;
pub use plan::{CachePolicy, RenderContent, RenderContext, RenderItem, plan_document, plan_node};
pub use text::{ApproxMetrics, TextLayout, TextMeasure, layout_text};
