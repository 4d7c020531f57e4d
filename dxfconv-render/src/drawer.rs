use dxfconv_core::{
    document::{Drawing, Entity},
    geometry::{Point2, Point3},
};
use tracing::trace;

use crate::errors::RenderError;
use crate::renderer::Renderer;
use crate::transform::PageTransform;

/// POINT 实体绘制为小圆的半径（绘图单位，随比例缩放）。
pub const POINT_MARKER_RADIUS: f64 = 1.0;

fn project(transform: &PageTransform, points: impl IntoIterator<Item = Point3>) -> Vec<Point2> {
    points
        .into_iter()
        .map(|point| transform.apply_point(point))
        .collect()
}

/// 绘制单个实体。返回 `false` 表示实体因点数不足被跳过。
pub fn draw_entity<R: Renderer + ?Sized>(
    renderer: &mut R,
    entity: &Entity,
    transform: &PageTransform,
) -> Result<bool, RenderError> {
    match entity {
        Entity::Line(line) => {
            let start = transform.apply_point(line.start);
            let end = transform.apply_point(line.end);
            renderer.line(start.x(), start.y(), end.x(), end.y())?;
        }
        Entity::Circle(circle) => {
            let center = transform.apply_point(circle.center);
            renderer.circle(center.x(), center.y(), transform.scale_length(circle.radius))?;
        }
        Entity::Arc(arc) => {
            let center = transform.apply_point(arc.center);
            renderer.arc(
                center.x(),
                center.y(),
                transform.scale_length(arc.radius),
                arc.start_angle,
                arc.end_angle,
            )?;
        }
        Entity::LwPolyline(polyline) => {
            if polyline.vertices.len() < 2 {
                return Ok(false);
            }
            let points = project(transform, polyline.vertices.iter().map(|v| v.position));
            renderer.polyline(&points, polyline.is_closed)?;
        }
        Entity::Polyline(polyline) => {
            if polyline.vertices.len() < 2 {
                return Ok(false);
            }
            let points = project(transform, polyline.vertices.iter().copied());
            renderer.polyline(&points, polyline.is_closed)?;
        }
        Entity::Spline(spline) => {
            // 以控制多边形近似样条
            if spline.control_points.len() < 2 {
                return Ok(false);
            }
            let points = project(transform, spline.control_points.iter().copied());
            renderer.polyline(&points, spline.is_closed)?;
        }
        Entity::Point(point) => {
            let center = transform.apply_point(point.position);
            renderer.circle(
                center.x(),
                center.y(),
                transform.scale_length(POINT_MARKER_RADIUS),
            )?;
        }
        Entity::Text(text) => {
            let anchor = transform.apply_point(text.insert);
            renderer.text(
                anchor.x(),
                anchor.y(),
                transform.scale_length(text.height),
                &text.content,
            )?;
        }
        Entity::MText(mtext) => {
            let anchor = transform.apply_point(mtext.insert);
            renderer.text(
                anchor.x(),
                anchor.y(),
                transform.scale_length(mtext.height),
                &mtext.content,
            )?;
        }
    }
    Ok(true)
}

/// 按场景顺序绘制全部实体，返回实际绘制的数量。
pub fn draw_drawing<R: Renderer + ?Sized>(
    renderer: &mut R,
    drawing: &Drawing,
    transform: &PageTransform,
) -> Result<usize, RenderError> {
    let mut drawn = 0;
    for entity in drawing.entities() {
        if draw_entity(renderer, entity, transform)? {
            drawn += 1;
        } else {
            trace!(kind = %entity.kind(), layer = entity.layer_name(), "点数不足，跳过实体");
        }
    }
    Ok(drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfconv_core::document::{
        Arc, Circle, Line, LwPolyline, LwPolylineVertex, Point, Spline, Text,
    };

    #[derive(Debug, PartialEq)]
    enum Call {
        Line(f64, f64, f64, f64),
        Circle(f64, f64, f64),
        Arc(f64, f64, f64, f64, f64),
        Polyline(Vec<(f64, f64)>, bool),
        Text(f64, f64, f64, String),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl Renderer for Recorder {
        fn init(&mut self, _width: f64, _height: f64) -> Result<(), RenderError> {
            Ok(())
        }

        fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), RenderError> {
            self.calls.push(Call::Line(x1, y1, x2, y2));
            Ok(())
        }

        fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), RenderError> {
            self.calls.push(Call::Circle(x, y, radius));
            Ok(())
        }

        fn arc(
            &mut self,
            x: f64,
            y: f64,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
        ) -> Result<(), RenderError> {
            self.calls
                .push(Call::Arc(x, y, radius, start_angle, end_angle));
            Ok(())
        }

        fn polyline(&mut self, points: &[Point2], closed: bool) -> Result<(), RenderError> {
            let points = points.iter().map(|p| (p.x(), p.y())).collect();
            self.calls.push(Call::Polyline(points, closed));
            Ok(())
        }

        fn text(&mut self, x: f64, y: f64, height: f64, value: &str) -> Result<(), RenderError> {
            self.calls
                .push(Call::Text(x, y, height, value.to_string()));
            Ok(())
        }

        fn finish(self) -> Result<(), RenderError> {
            Ok(())
        }
    }

    // 比例 2，无偏移，页面高 100
    fn transform() -> PageTransform {
        PageTransform {
            scale: 2.0,
            offset_x: 0.0,
            offset_y: 0.0,
            page_height: 100.0,
        }
    }

    #[test]
    fn primitives_are_transformed_and_scaled() {
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::Line(Line {
            start: Point3::new(0.0, 0.0, 0.0),
            end: Point3::new(10.0, 5.0, 0.0),
            ..Default::default()
        }));
        drawing.add_entity(Entity::Circle(Circle {
            center: Point3::new(5.0, 5.0, 0.0),
            radius: 3.0,
            ..Default::default()
        }));
        drawing.add_entity(Entity::Arc(Arc {
            center: Point3::new(1.0, 1.0, 0.0),
            radius: 2.0,
            start_angle: 30.0,
            end_angle: 120.0,
            ..Default::default()
        }));
        drawing.add_entity(Entity::Text(Text {
            insert: Point3::new(2.0, 3.0, 0.0),
            height: 2.5,
            content: "A".to_string(),
            ..Default::default()
        }));

        let mut recorder = Recorder::default();
        let drawn = draw_drawing(&mut recorder, &drawing, &transform()).unwrap();
        assert_eq!(drawn, 4);
        assert_eq!(
            recorder.calls,
            vec![
                Call::Line(0.0, 100.0, 20.0, 90.0),
                Call::Circle(10.0, 90.0, 6.0),
                Call::Arc(2.0, 98.0, 4.0, 30.0, 120.0),
                Call::Text(4.0, 94.0, 5.0, "A".to_string()),
            ]
        );
    }

    #[test]
    fn point_is_drawn_as_scaled_marker() {
        let mut recorder = Recorder::default();
        let point = Entity::Point(Point {
            position: Point3::new(10.0, 10.0, 0.0),
            ..Default::default()
        });
        assert!(draw_entity(&mut recorder, &point, &transform()).unwrap());
        assert_eq!(recorder.calls, vec![Call::Circle(20.0, 80.0, 2.0)]);
    }

    #[test]
    fn short_polylines_and_splines_are_skipped() {
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::LwPolyline(LwPolyline {
            vertices: vec![LwPolylineVertex::new(Point3::new(1.0, 1.0, 0.0))],
            ..Default::default()
        }));
        drawing.add_entity(Entity::Spline(Spline {
            control_points: vec![Point3::new(0.0, 0.0, 0.0)],
            ..Default::default()
        }));
        drawing.add_entity(Entity::LwPolyline(LwPolyline {
            vertices: vec![
                LwPolylineVertex::new(Point3::new(0.0, 0.0, 0.0)),
                LwPolylineVertex::new(Point3::new(5.0, 0.0, 0.0)),
                LwPolylineVertex::new(Point3::new(5.0, 5.0, 0.0)),
            ],
            is_closed: true,
            ..Default::default()
        }));

        let mut recorder = Recorder::default();
        let drawn = draw_drawing(&mut recorder, &drawing, &transform()).unwrap();
        assert_eq!(drawn, 1);
        assert_eq!(
            recorder.calls,
            vec![Call::Polyline(
                vec![(0.0, 100.0), (10.0, 100.0), (10.0, 90.0)],
                true
            )]
        );
    }
}
