pub mod geometry {
    use glam::{DVec2, DVec3};
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，主要承载已变换到页面空间的坐标。
    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 三维点。DXF 中的坐标均为三分量，Z 会被解析保存，但排版时不参与计算。
    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn set_x(&mut self, value: f64) {
            self.0.x = value;
        }

        #[inline]
        pub fn set_y(&mut self, value: f64) {
            self.0.y = value;
        }

        #[inline]
        pub fn set_z(&mut self, value: f64) {
            self.0.z = value;
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        /// 丢弃 Z 分量，得到平面投影。
        #[inline]
        pub fn truncate(self) -> Point2 {
            Point2(self.0.truncate())
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框。
    ///
    /// 初始值使用 `f64::MAX` 哨兵而非无穷大，保证后续算术保持有限；
    /// 第一次 `update` 即得到退化为单点的边界框。`update` 满足交换律与幂等性，
    /// 因此累加顺序不影响结果。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct BoundingBox {
        pub min_x: f64,
        pub min_y: f64,
        pub max_x: f64,
        pub max_y: f64,
    }

    impl BoundingBox {
        #[inline]
        pub fn new() -> Self {
            Self {
                min_x: f64::MAX,
                min_y: f64::MAX,
                max_x: -f64::MAX,
                max_y: -f64::MAX,
            }
        }

        /// 尚未包含任何点。
        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min_x > self.max_x || self.min_y > self.max_y
        }

        pub fn update(&mut self, x: f64, y: f64) {
            self.min_x = self.min_x.min(x);
            self.min_y = self.min_y.min(y);
            self.max_x = self.max_x.max(x);
            self.max_y = self.max_y.max(y);
        }

        #[inline]
        pub fn update_point(&mut self, point: Point3) {
            self.update(point.x(), point.y());
        }

        /// 以 `center ± radius` 扩展，圆与圆弧共用。
        pub fn update_circle(&mut self, center: Point3, radius: f64) {
            self.update(center.x() - radius, center.y() - radius);
            self.update(center.x() + radius, center.y() + radius);
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max_x - self.min_x
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max_y - self.min_y
        }
    }

    impl Default for BoundingBox {
        fn default() -> Self {
            Self::new()
        }
    }
}

pub mod document {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{BoundingBox, Point3};

    /// 可识别的九种实体类型，名称与 DXF 中 `0` 组码的取值一致。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum EntityKind {
        Line,
        Circle,
        Arc,
        LwPolyline,
        Polyline,
        Spline,
        Point,
        Text,
        MText,
    }

    impl EntityKind {
        pub fn from_dxf_name(name: &str) -> Option<Self> {
            let kind = match name {
                "LINE" => Self::Line,
                "CIRCLE" => Self::Circle,
                "ARC" => Self::Arc,
                "LWPOLYLINE" => Self::LwPolyline,
                "POLYLINE" => Self::Polyline,
                "SPLINE" => Self::Spline,
                "POINT" => Self::Point,
                "TEXT" => Self::Text,
                "MTEXT" => Self::MText,
                _ => return None,
            };
            Some(kind)
        }

        pub fn dxf_name(self) -> &'static str {
            match self {
                Self::Line => "LINE",
                Self::Circle => "CIRCLE",
                Self::Arc => "ARC",
                Self::LwPolyline => "LWPOLYLINE",
                Self::Polyline => "POLYLINE",
                Self::Spline => "SPLINE",
                Self::Point => "POINT",
                Self::Text => "TEXT",
                Self::MText => "MTEXT",
            }
        }
    }

    impl fmt::Display for EntityKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.dxf_name())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Circle(Circle),
        Arc(Arc),
        LwPolyline(LwPolyline),
        Polyline(Polyline),
        Spline(Spline),
        Point(Point),
        Text(Text),
        MText(MText),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Line(line) => &line.layer,
                Entity::Circle(circle) => &circle.layer,
                Entity::Arc(arc) => &arc.layer,
                Entity::LwPolyline(polyline) => &polyline.layer,
                Entity::Polyline(polyline) => &polyline.layer,
                Entity::Spline(spline) => &spline.layer,
                Entity::Point(point) => &point.layer,
                Entity::Text(text) => &text.layer,
                Entity::MText(mtext) => &mtext.layer,
            }
        }

        pub fn kind(&self) -> EntityKind {
            match self {
                Entity::Line(_) => EntityKind::Line,
                Entity::Circle(_) => EntityKind::Circle,
                Entity::Arc(_) => EntityKind::Arc,
                Entity::LwPolyline(_) => EntityKind::LwPolyline,
                Entity::Polyline(_) => EntityKind::Polyline,
                Entity::Spline(_) => EntityKind::Spline,
                Entity::Point(_) => EntityKind::Point,
                Entity::Text(_) => EntityKind::Text,
                Entity::MText(_) => EntityKind::MText,
            }
        }

        /// 将实体范围并入 `bounds`。
        ///
        /// 圆弧按整圆估算，样条按控制点凸包估算，文字只计入插入点：
        /// 这些都是刻意的宽松估计，居中结果依赖于此，不要悄悄收紧。
        pub fn extend_bounds(&self, bounds: &mut BoundingBox) {
            match self {
                Entity::Line(line) => {
                    bounds.update_point(line.start);
                    bounds.update_point(line.end);
                }
                Entity::Circle(circle) => bounds.update_circle(circle.center, circle.radius),
                Entity::Arc(arc) => bounds.update_circle(arc.center, arc.radius),
                Entity::LwPolyline(polyline) => {
                    for vertex in &polyline.vertices {
                        bounds.update_point(vertex.position);
                    }
                }
                Entity::Polyline(polyline) => {
                    for vertex in &polyline.vertices {
                        bounds.update_point(*vertex);
                    }
                }
                Entity::Spline(spline) => {
                    for point in &spline.control_points {
                        bounds.update_point(*point);
                    }
                }
                Entity::Point(point) => bounds.update_point(point.position),
                Entity::Text(text) => bounds.update_point(text.insert),
                Entity::MText(mtext) => bounds.update_point(mtext.insert),
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point3,
        pub end: Point3,
        pub layer: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point3,
        pub radius: f64,
        pub layer: String,
    }

    /// 圆弧实体，角度保持 DXF 原始的角度制，逆时针为正方向。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point3,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
        pub layer: String,
    }

    /// 轻量多段线顶点，`bulge` 只做保留，渲染时按直线段处理。
    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    pub struct LwPolylineVertex {
        pub position: Point3,
        pub bulge: f64,
    }

    impl LwPolylineVertex {
        #[inline]
        pub fn new(position: Point3) -> Self {
            Self {
                position,
                bulge: 0.0,
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct LwPolyline {
        pub vertices: Vec<LwPolylineVertex>,
        pub is_closed: bool,
        pub layer: String,
    }

    /// 旧式多段线，顶点来自紧随其后的 VERTEX 子记录。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<Point3>,
        pub is_closed: bool,
        pub layer: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Spline {
        pub control_points: Vec<Point3>,
        pub knot_values: Vec<f64>,
        pub degree: i32,
        pub is_closed: bool,
        pub layer: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Point {
        pub position: Point3,
        pub layer: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point3,
        pub height: f64,
        pub content: String,
        pub layer: String,
    }

    /// 多行文字，`content` 为所有 1/3 组码片段按出现顺序拼接的结果。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct MText {
        pub insert: Point3,
        pub height: f64,
        pub content: String,
        pub layer: String,
    }

    /// 解析得到的场景：实体按文件顺序排列，解析完成后只读。
    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Drawing {
        entities: Vec<Entity>,
    }

    impl Drawing {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_entity(&mut self, entity: Entity) {
            self.entities.push(entity);
        }

        pub fn entities(&self) -> impl Iterator<Item = &Entity> {
            self.entities.iter()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entities.is_empty()
        }

        /// 单次遍历计算全部实体的范围。空文档返回未触碰的哨兵边界框。
        pub fn bounding_box(&self) -> BoundingBox {
            let mut bounds = BoundingBox::new();
            for entity in &self.entities {
                entity.extend_bounds(&mut bounds);
            }
            bounds
        }
    }
}

pub mod options {
    use serde::{Deserialize, Serialize};

    /// 页面尺寸，单位与绘图单位一致（默认按毫米理解）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct PageSize {
        pub width: f64,
        pub height: f64,
    }

    impl PageSize {
        pub const A3: PageSize = PageSize::new(297.0, 420.0);
        pub const A4: PageSize = PageSize::new(210.0, 297.0);
        pub const A5: PageSize = PageSize::new(148.0, 210.0);
        pub const LETTER: PageSize = PageSize::new(215.9, 279.4);

        #[inline]
        pub const fn new(width: f64, height: f64) -> Self {
            Self { width, height }
        }

        /// 按名称查找预设尺寸，忽略大小写。
        pub fn from_name(name: &str) -> Option<Self> {
            match name.trim().to_ascii_lowercase().as_str() {
                "a3" => Some(Self::A3),
                "a4" => Some(Self::A4),
                "a5" => Some(Self::A5),
                "letter" => Some(Self::LETTER),
                _ => None,
            }
        }
    }

    impl Default for PageSize {
        fn default() -> Self {
            Self::A4
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Orientation {
        #[default]
        Portrait,
        Landscape,
    }

    /// 输出格式：页面描述文档（PDF）或可缩放标记（SVG）。
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum OutputFormat {
        #[default]
        Pdf,
        Svg,
    }

    impl OutputFormat {
        pub fn from_extension(extension: &str) -> Option<Self> {
            match extension.to_ascii_lowercase().as_str() {
                "pdf" => Some(Self::Pdf),
                "svg" => Some(Self::Svg),
                _ => None,
            }
        }
    }

    /// 单次转换的渲染参数，调用期间不可变。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RenderOptions {
        pub page_size: PageSize,
        pub orientation: Orientation,
        pub format: OutputFormat,
        /// 为 0 时自动适配页面。
        pub scale: f64,
        pub margin: f64,
        pub font: Option<String>,
    }

    impl RenderOptions {
        /// 应用方向后的页面宽高。预设尺寸按纵向给出，横向时交换宽高。
        pub fn page_dimensions(&self) -> (f64, f64) {
            match self.orientation {
                Orientation::Portrait => (self.page_size.width, self.page_size.height),
                Orientation::Landscape => (self.page_size.height, self.page_size.width),
            }
        }
    }

    impl Default for RenderOptions {
        fn default() -> Self {
            Self {
                page_size: PageSize::A4,
                orientation: Orientation::Portrait,
                format: OutputFormat::Pdf,
                scale: 0.0,
                margin: 10.0,
                font: None,
            }
        }
    }
}
