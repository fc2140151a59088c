//! Frame planning for the current editing state.

use crate::editor::Editor;
use card_core::IconResolver;
use card_render::{
    ApproxMetrics, IconLibrary, ImageCache, ImageFetcher, RenderContext, RenderItem, TextMeasure,
    plan_document,
};

/// Long-lived render resources owned by the host alongside the editor.
pub struct FrameResources<'a> {
    pub images: &'a mut ImageCache,
    pub fetcher: &'a mut dyn ImageFetcher,
    pub icons: &'a dyn IconResolver,
    pub measure: &'a dyn TextMeasure,
}

impl Editor {
    /// Display list for the document as it should look right now, with the
    /// glyph under the text-edit overlay left out.
    pub fn plan_frame(&self, res: FrameResources<'_>) -> Vec<RenderItem> {
        let mut ctx = RenderContext {
            editing: self.editing_node(),
            images: res.images,
            fetcher: res.fetcher,
            icons: IconLibrary::new(res.icons, self.config.default_icon_prefix.clone()),
            measure: res.measure,
        };
        plan_document(&self.doc, &mut ctx)
    }

    /// `plan_frame` with approximate text metrics.
    pub fn plan_with(
        &self,
        images: &mut ImageCache,
        fetcher: &mut dyn ImageFetcher,
        icons: &dyn IconResolver,
    ) -> Vec<RenderItem> {
        self.plan_frame(FrameResources {
            images,
            fetcher,
            icons,
            measure: &ApproxMetrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::kurbo::Point;
    use card_core::{NodeKind, StaticAssets};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn edited_text_is_left_out_of_the_frame() {
        let mut editor = Editor::default();
        let text = editor.add_node(NodeKind::Text, Point::ZERO, &json!({"text": "Hi"}));
        let rect = editor.add_node(NodeKind::Rect, Point::ZERO, &serde_json::Value::Null);
        let assets = StaticAssets::default();
        let mut images = ImageCache::new();
        let mut fetch = |_: &str| {};

        let ids = |items: Vec<RenderItem>| items.into_iter().map(|i| i.id).collect::<Vec<_>>();
        assert_eq!(ids(editor.plan_with(&mut images, &mut fetch, &assets)), vec![text, rect]);

        editor.enter_text_edit(text);
        assert_eq!(ids(editor.plan_with(&mut images, &mut fetch, &assets)), vec![rect]);

        editor.commit_text_edit();
        assert_eq!(ids(editor.plan_with(&mut images, &mut fetch, &assets)), vec![text, rect]);
    }
}
