//! SVG path-data parser → `kurbo::BezPath`.
//!
//! Built on `winnow` 0.7. Handles the full command set (`M L H V C S Q T A Z`,
//! absolute and relative, with implicit repeats) and the loose number
//! separators design tools emit (`10-5`, `1.5.5`, no spaces after commands).

use crate::model::SubPath;
use kurbo::{Affine, Arc, BezPath, PathEl, Point, Rect, Shape, SvgArc, Vec2};
use winnow::ascii::float;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::one_of;

/// Path data that could not be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("path data error at byte {offset}: {message}")]
pub struct PathDataError {
    pub offset: usize,
    pub message: String,
}

/// Parse SVG path data into absolute Bézier geometry.
pub fn parse_path_data(data: &str) -> Result<BezPath, PathDataError> {
    let mut input = data;
    let mut state = PathState::default();
    let error_at = |rest: &str, message: String| PathDataError {
        offset: data.len() - rest.len(),
        message,
    };

    loop {
        skip_separators(&mut input);
        if input.is_empty() {
            break;
        }
        let cmd = command
            .parse_next(&mut input)
            .map_err(|_| error_at(input, "expected a path command".into()))?;
        state
            .apply(cmd, &mut input)
            .map_err(|_| error_at(input, format!("bad arguments for `{cmd}`")))?;
    }

    Ok(state.path)
}

/// Union of the bounds of every sub-path that parses. `None` when nothing
/// parses or all sub-paths are empty.
pub fn subpaths_bounds(subpaths: &[SubPath]) -> Option<Rect> {
    subpaths
        .iter()
        .filter_map(|sp| match parse_path_data(&sp.data) {
            Ok(path) if !path.elements().is_empty() => Some(path.bounding_box()),
            Ok(_) => None,
            Err(e) => {
                log::warn!("skipping malformed sub-path: {e}");
                None
            }
        })
        .reduce(|a, b| a.union(b))
}

/// Map geometry whose extent is `source` onto the box `(0, 0, width, height)`.
///
/// Size goes into the coordinates themselves rather than a scale transform,
/// so stroke widths applied afterwards are not scaled with the shape.
pub fn fit_to_box(path: &BezPath, source: Rect, width: f64, height: f64) -> BezPath {
    let sx = if source.width() > f64::EPSILON {
        width / source.width()
    } else {
        1.0
    };
    let sy = if source.height() > f64::EPSILON {
        height / source.height()
    } else {
        1.0
    };
    let mut out = path.clone();
    out.apply_affine(
        Affine::scale_non_uniform(sx, sy) * Affine::translate(-source.origin().to_vec2()),
    );
    out
}

// ─── Parser state ────────────────────────────────────────────────────────

#[derive(Default)]
struct PathState {
    path: BezPath,
    current: Point,
    start: Point,
    /// Second control point of the previous cubic (for `S`).
    last_cubic: Option<Point>,
    /// Control point of the previous quadratic (for `T`).
    last_quad: Option<Point>,
}

impl PathState {
    fn apply(&mut self, cmd: char, input: &mut &str) -> ModalResult<()> {
        let upper = cmd.to_ascii_uppercase();
        if upper == 'Z' {
            if !self.path.elements().is_empty() {
                self.path.close_path();
            }
            self.current = self.start;
            self.last_cubic = None;
            self.last_quad = None;
            return Ok(());
        }

        let rel = cmd.is_ascii_lowercase();
        let mut first = true;
        while first || starts_number(input) {
            let mut cubic = None;
            let mut quad = None;
            match upper {
                'M' if first => {
                    let p = self.point(input, rel)?;
                    self.path.move_to(p);
                    self.current = p;
                    self.start = p;
                }
                'M' | 'L' => {
                    let p = self.point(input, rel)?;
                    self.line_to(p);
                }
                'H' => {
                    let x = number(input)?;
                    let x = if rel { self.current.x + x } else { x };
                    self.line_to(Point::new(x, self.current.y));
                }
                'V' => {
                    let y = number(input)?;
                    let y = if rel { self.current.y + y } else { y };
                    self.line_to(Point::new(self.current.x, y));
                }
                'C' => {
                    let c1 = self.point(input, rel)?;
                    let c2 = self.point(input, rel)?;
                    let p = self.point(input, rel)?;
                    self.ensure_started();
                    self.path.curve_to(c1, c2, p);
                    self.current = p;
                    cubic = Some(c2);
                }
                'S' => {
                    let c1 = reflect(self.last_cubic, self.current);
                    let c2 = self.point(input, rel)?;
                    let p = self.point(input, rel)?;
                    self.ensure_started();
                    self.path.curve_to(c1, c2, p);
                    self.current = p;
                    cubic = Some(c2);
                }
                'Q' => {
                    let c = self.point(input, rel)?;
                    let p = self.point(input, rel)?;
                    self.ensure_started();
                    self.path.quad_to(c, p);
                    self.current = p;
                    quad = Some(c);
                }
                'T' => {
                    let c = reflect(self.last_quad, self.current);
                    let p = self.point(input, rel)?;
                    self.ensure_started();
                    self.path.quad_to(c, p);
                    self.current = p;
                    quad = Some(c);
                }
                'A' => {
                    let rx = number(input)?;
                    let ry = number(input)?;
                    let rotation = number(input)?;
                    let large_arc = flag(input)?;
                    let sweep = flag(input)?;
                    let p = self.point(input, rel)?;
                    self.arc_to(Vec2::new(rx, ry), rotation, large_arc, sweep, p);
                }
                _ => return Err(ErrMode::Backtrack(ContextError::new())),
            }
            self.last_cubic = cubic;
            self.last_quad = quad;
            first = false;
        }
        Ok(())
    }

    fn point(&self, input: &mut &str, rel: bool) -> ModalResult<Point> {
        let x = number(input)?;
        let y = number(input)?;
        Ok(if rel {
            Point::new(self.current.x + x, self.current.y + y)
        } else {
            Point::new(x, y)
        })
    }

    /// Drawing commands need an open sub-path; start one at the pen.
    fn ensure_started(&mut self) {
        if matches!(self.path.elements().last(), None | Some(PathEl::ClosePath)) {
            self.path.move_to(self.current);
        }
    }

    fn line_to(&mut self, p: Point) {
        self.ensure_started();
        self.path.line_to(p);
        self.current = p;
    }

    fn arc_to(&mut self, radii: Vec2, rotation_deg: f64, large_arc: bool, sweep: bool, to: Point) {
        self.ensure_started();
        let svg_arc = SvgArc {
            from: self.current,
            to,
            radii,
            x_rotation: rotation_deg.to_radians(),
            large_arc,
            sweep,
        };
        match Arc::from_svg_arc(&svg_arc) {
            Some(arc) => {
                for el in arc.append_iter(0.1) {
                    self.path.push(el);
                }
            }
            // Degenerate radii: SVG says draw a straight line.
            None => self.path.line_to(to),
        }
        self.current = to;
    }
}

fn reflect(control: Option<Point>, about: Point) -> Point {
    match control {
        Some(c) => about + (about - c),
        None => about,
    }
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn skip_separators(input: &mut &str) {
    *input = input.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
}

fn starts_number(input: &mut &str) -> bool {
    skip_separators(input);
    input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

fn command(input: &mut &str) -> ModalResult<char> {
    one_of(|c: char| "MmLlHhVvCcSsQqTtAaZz".contains(c)).parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f64> {
    skip_separators(input);
    float.parse_next(input)
}

fn flag(input: &mut &str) -> ModalResult<bool> {
    skip_separators(input);
    one_of(['0', '1']).map(|c| c == '1').parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FillRule;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_absolute_polygon() {
        let path = parse_path_data("M0 0 L10 0 L10 10 Z").unwrap();
        assert_eq!(path.elements().len(), 4);
        assert_eq!(path.bounding_box(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn relative_commands_accumulate() {
        let path = parse_path_data("m5 5 l10 0 v10 h-10 z").unwrap();
        assert_eq!(path.bounding_box(), Rect::new(5.0, 5.0, 15.0, 15.0));
    }

    #[test]
    fn implicit_lineto_after_move() {
        let path = parse_path_data("M0,0 20,0 20,20").unwrap();
        assert_eq!(
            path.elements(),
            &[
                PathEl::MoveTo(Point::new(0.0, 0.0)),
                PathEl::LineTo(Point::new(20.0, 0.0)),
                PathEl::LineTo(Point::new(20.0, 20.0)),
            ]
        );
    }

    #[test]
    fn compact_numbers_split_on_sign() {
        let path = parse_path_data("M10-5L20-5").unwrap();
        assert_eq!(
            path.elements()[1],
            PathEl::LineTo(Point::new(20.0, -5.0))
        );
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
        let path = parse_path_data("M0 0 C0 10 10 10 10 0 S20 -10 20 0").unwrap();
        match path.elements()[2] {
            PathEl::CurveTo(c1, _, _) => assert_eq!(c1, Point::new(10.0, -10.0)),
            ref other => panic!("expected CurveTo, got {other:?}"),
        }
    }

    #[test]
    fn arcs_become_curves() {
        let path = parse_path_data("M0 0 A10 10 0 0 1 20 0").unwrap();
        assert!(
            path.elements()
                .iter()
                .any(|el| matches!(el, PathEl::CurveTo(..)))
        );
    }

    #[test]
    fn garbage_reports_offset() {
        let err = parse_path_data("M0 0 X 5").unwrap_err();
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn fit_to_box_scales_coordinates() {
        let path = parse_path_data("M10 10 L30 10 L30 20 Z").unwrap();
        let source = path.bounding_box();
        let fitted = fit_to_box(&path, source, 100.0, 50.0);
        assert_eq!(fitted.bounding_box(), Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn bounds_union_skips_malformed() {
        let subpaths = [
            SubPath {
                data: "M0 0 L10 10".into(),
                fill_rule: FillRule::NonZero,
            },
            SubPath {
                data: "nonsense".into(),
                fill_rule: FillRule::EvenOdd,
            },
            SubPath {
                data: "M20 0 L30 5".into(),
                fill_rule: FillRule::EvenOdd,
            },
        ];
        assert_eq!(
            subpaths_bounds(&subpaths),
            Some(Rect::new(0.0, 0.0, 30.0, 10.0))
        );
    }
}
