use std::io::BufRead;

use dxfconv_core::{
    document::{
        Arc, Circle, Drawing, Entity, EntityKind, Line, LwPolyline, LwPolylineVertex, MText,
        Point, Polyline, Spline, Text,
    },
    geometry::Point3,
};
use tracing::{debug, warn};

use crate::DxfError;
use crate::scanner::{Tag, TagScanner};

// Reference: https://help.autodesk.com/view/OARX/2021/ENU/?guid=GUID-235B22E0-A567-4CF6-92D3-38A2306D73F3

/// DXF 实体解析器：识别 SECTION 结构，只解释 ENTITIES 段。
///
/// 数值转换失败会中止整个解析；实体顺序异常（例如缺少 SEQEND）则尽量容忍，
/// 因为下游渲染可以接受不完整的实体。
pub struct DxfParser<R> {
    scanner: TagScanner<R>,
}

impl<R: BufRead> DxfParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            scanner: TagScanner::new(reader),
        }
    }

    pub fn parse(mut self) -> Result<Drawing, DxfError> {
        let mut drawing = Drawing::new();
        while let Some(tag) = self.scanner.next_tag()? {
            if tag.is(0, "SECTION") {
                self.parse_section(&mut drawing)?;
            } else if tag.is(0, "EOF") {
                break;
            }
        }
        debug!(
            entity_count = drawing.len(),
            lines = self.scanner.line(),
            "DXF 解析完成"
        );
        Ok(drawing)
    }

    fn parse_section(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        while let Some(tag) = self.scanner.next_tag()? {
            if tag.code == 2 {
                if tag.keyword() == "ENTITIES" {
                    return self.parse_entities(drawing);
                }
                debug!(section = tag.keyword(), line = tag.line, "跳过未解释的段");
                return self.skip_section();
            }
            if tag.is(0, "ENDSEC") {
                return Ok(());
            }
        }
        Ok(())
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        while let Some(tag) = self.scanner.next_tag()? {
            if tag.is(0, "ENDSEC") {
                return Ok(());
            }
        }
        warn!("SECTION 未找到 ENDSEC 终止标记");
        Ok(())
    }

    fn parse_entities(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        while let Some(tag) = self.scanner.next_tag()? {
            if tag.code != 0 {
                continue;
            }
            if tag.keyword() == "ENDSEC" {
                return Ok(());
            }
            match EntityKind::from_dxf_name(tag.keyword()) {
                Some(kind) => {
                    let entity = self.parse_entity(kind)?;
                    drawing.add_entity(entity);
                }
                None => {
                    debug!(kind = tag.keyword(), line = tag.line, "跳过不支持的实体");
                    self.skip_entity()?;
                }
            }
        }
        warn!("ENTITIES 段提前结束，未找到 ENDSEC");
        Ok(())
    }

    fn parse_entity(&mut self, kind: EntityKind) -> Result<Entity, DxfError> {
        match kind {
            EntityKind::Line => self.parse_line(),
            EntityKind::Circle => self.parse_circle(),
            EntityKind::Arc => self.parse_arc(),
            EntityKind::LwPolyline => self.parse_lwpolyline(),
            EntityKind::Polyline => self.parse_polyline(),
            EntityKind::Spline => self.parse_spline(),
            EntityKind::Point => self.parse_point(),
            EntityKind::Text => self.parse_text(),
            EntityKind::MText => self.parse_mtext(),
        }
    }

    /// 读取当前实体的下一个字段标签。遇到下一个 0 组码时将其退回并返回 `None`，
    /// 使其作为下一个实体或 ENDSEC 重新处理。
    fn next_field(&mut self) -> Result<Option<Tag>, DxfError> {
        match self.scanner.next_tag()? {
            Some(tag) if tag.code == 0 => {
                self.scanner.push_back(tag);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// 消费标签直到下一个 0 组码边界。
    fn skip_entity(&mut self) -> Result<(), DxfError> {
        while self.next_field()?.is_some() {}
        Ok(())
    }

    fn parse_line(&mut self) -> Result<Entity, DxfError> {
        let mut line = Line::default();
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => line.layer = tag.value,
                10 => line.start.set_x(tag.parse_f64()?),
                20 => line.start.set_y(tag.parse_f64()?),
                30 => line.start.set_z(tag.parse_f64()?),
                11 => line.end.set_x(tag.parse_f64()?),
                21 => line.end.set_y(tag.parse_f64()?),
                31 => line.end.set_z(tag.parse_f64()?),
                _ => {}
            }
        }
        Ok(Entity::Line(line))
    }

    fn parse_circle(&mut self) -> Result<Entity, DxfError> {
        let mut circle = Circle::default();
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => circle.layer = tag.value,
                10 => circle.center.set_x(tag.parse_f64()?),
                20 => circle.center.set_y(tag.parse_f64()?),
                30 => circle.center.set_z(tag.parse_f64()?),
                40 => circle.radius = tag.parse_f64()?,
                _ => {}
            }
        }
        Ok(Entity::Circle(circle))
    }

    fn parse_arc(&mut self) -> Result<Entity, DxfError> {
        let mut arc = Arc::default();
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => arc.layer = tag.value,
                10 => arc.center.set_x(tag.parse_f64()?),
                20 => arc.center.set_y(tag.parse_f64()?),
                30 => arc.center.set_z(tag.parse_f64()?),
                40 => arc.radius = tag.parse_f64()?,
                50 => arc.start_angle = tag.parse_f64()?,
                51 => arc.end_angle = tag.parse_f64()?,
                _ => {}
            }
        }
        Ok(Entity::Arc(arc))
    }

    /// 组码 10 提交正在构建的顶点并开始新顶点，随后的 20/42 填充该顶点，
    /// 因此第 N 个 10 组码总是对应第 N 个顶点。
    fn parse_lwpolyline(&mut self) -> Result<Entity, DxfError> {
        let mut polyline = LwPolyline::default();
        let mut current: Option<LwPolylineVertex> = None;
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => polyline.layer = tag.value,
                70 => {
                    if tag.try_i32().is_some_and(|flags| flags & 1 == 1) {
                        polyline.is_closed = true;
                    }
                }
                10 => {
                    polyline.vertices.extend(current.take());
                    let x = tag.parse_f64()?;
                    current = Some(LwPolylineVertex::new(Point3::new(x, 0.0, 0.0)));
                }
                20 => {
                    if let Some(vertex) = current.as_mut() {
                        vertex.position.set_y(tag.parse_f64()?);
                    }
                }
                42 => {
                    if let Some(vertex) = current.as_mut() {
                        vertex.bulge = tag.parse_f64()?;
                    }
                }
                _ => {}
            }
        }
        polyline.vertices.extend(current.take());
        Ok(Entity::LwPolyline(polyline))
    }

    /// POLYLINE 自身只携带闭合标志，顶点来自随后的 VERTEX 子记录，以 SEQEND 结束。
    fn parse_polyline(&mut self) -> Result<Entity, DxfError> {
        let mut polyline = Polyline::default();
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => polyline.layer = tag.value,
                70 => {
                    if tag.try_i32().is_some_and(|flags| flags & 1 == 1) {
                        polyline.is_closed = true;
                    }
                }
                _ => {}
            }
        }

        while let Some(tag) = self.scanner.next_tag()? {
            if tag.code != 0 {
                continue;
            }
            match tag.keyword() {
                "VERTEX" => {
                    let vertex = self.parse_vertex()?;
                    polyline.vertices.push(vertex);
                }
                "SEQEND" => {
                    self.skip_entity()?;
                    return Ok(Entity::Polyline(polyline));
                }
                _ => {
                    debug!(
                        line = tag.line,
                        next = tag.keyword(),
                        "POLYLINE 缺少 SEQEND，按已读取的顶点结束"
                    );
                    self.scanner.push_back(tag);
                    break;
                }
            }
        }
        Ok(Entity::Polyline(polyline))
    }

    /// VERTEX 记录中可能混有图层、句柄等非数值字段，转换失败的标签直接忽略。
    fn parse_vertex(&mut self) -> Result<Point3, DxfError> {
        let mut vertex = Point3::default();
        while let Some(tag) = self.next_field()? {
            let Some(value) = tag.try_f64() else {
                continue;
            };
            match tag.code {
                10 => vertex.set_x(value),
                20 => vertex.set_y(value),
                30 => vertex.set_z(value),
                _ => {}
            }
        }
        Ok(vertex)
    }

    /// 控制点沿用 LWPOLYLINE 的增量规则；节点值（40）独立追加。
    fn parse_spline(&mut self) -> Result<Entity, DxfError> {
        let mut spline = Spline::default();
        let mut current: Option<Point3> = None;
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => spline.layer = tag.value,
                70 => {
                    if tag.try_i32().is_some_and(|flags| flags & 1 == 1) {
                        spline.is_closed = true;
                    }
                }
                71 => {
                    if let Some(degree) = tag.try_i32() {
                        spline.degree = degree;
                    }
                }
                10 => {
                    spline.control_points.extend(current.take());
                    current = Some(Point3::new(tag.parse_f64()?, 0.0, 0.0));
                }
                20 => {
                    if let Some(point) = current.as_mut() {
                        point.set_y(tag.parse_f64()?);
                    }
                }
                30 => {
                    if let Some(point) = current.as_mut() {
                        point.set_z(tag.parse_f64()?);
                    }
                }
                40 => spline.knot_values.push(tag.parse_f64()?),
                _ => {}
            }
        }
        spline.control_points.extend(current.take());
        Ok(Entity::Spline(spline))
    }

    fn parse_point(&mut self) -> Result<Entity, DxfError> {
        let mut point = Point::default();
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => point.layer = tag.value,
                10 => point.position.set_x(tag.parse_f64()?),
                20 => point.position.set_y(tag.parse_f64()?),
                30 => point.position.set_z(tag.parse_f64()?),
                _ => {}
            }
        }
        Ok(Entity::Point(point))
    }

    fn parse_text(&mut self) -> Result<Entity, DxfError> {
        let mut text = Text::default();
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => text.layer = tag.value,
                1 => text.content = tag.value,
                10 | 20 | 30 | 40 => {
                    let Some(value) = tag.try_f64() else {
                        continue;
                    };
                    match tag.code {
                        10 => text.insert.set_x(value),
                        20 => text.insert.set_y(value),
                        30 => text.insert.set_z(value),
                        _ => text.height = value,
                    }
                }
                _ => {}
            }
        }
        Ok(Entity::Text(text))
    }

    /// 长文本会被拆成多个 3 组码片段加一个 1 组码片段，按出现顺序拼接。
    fn parse_mtext(&mut self) -> Result<Entity, DxfError> {
        let mut mtext = MText::default();
        while let Some(tag) = self.next_field()? {
            match tag.code {
                8 => mtext.layer = tag.value,
                1 | 3 => mtext.content.push_str(&tag.value),
                10 | 20 | 30 | 40 => {
                    let Some(value) = tag.try_f64() else {
                        continue;
                    };
                    match tag.code {
                        10 => mtext.insert.set_x(value),
                        20 => mtext.insert.set_y(value),
                        30 => mtext.insert.set_z(value),
                        _ => mtext.height = value,
                    }
                }
                _ => {}
            }
        }
        Ok(Entity::MText(mtext))
    }
}
