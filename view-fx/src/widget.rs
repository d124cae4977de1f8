//! # Widget 模块
//!
//! 宿主控件接口。
//!
//! ## 核心概念
//!
//! - [`Widget`]：按名称读写属性的控件（getter/setter）
//! - [`Scene`]：把控件名解析为控件，以及查找序列播放器
//! - [`Target`]：控件标识，可以是名称，也可以是已经解析好的控件
//! - [`SceneWidget`] / [`SceneGraph`]：内存实现，用于测试和无头宿主

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::value::PropertyValue;

/// 常用属性名
pub mod props {
    /// CSS 颜色覆盖，空字符串表示默认颜色
    pub const COLOR: &str = "color";
    /// 不透明度
    pub const OPACITY: &str = "opacity";
    /// 缩放
    pub const SCALE: &str = "scale";
    /// 是否可见
    pub const VISIBLE: &str = "visible";
    /// 资源路径（图片 / 模型）
    pub const SRC: &str = "src";
    /// 序列控件的当前步骤
    pub const CURRENT_STEP: &str = "currentStep";
}

/// 旋转属性名：`r<axis>`，轴名转小写
pub fn rotation_property(axis: &str) -> String {
    format!("r{}", axis.to_lowercase())
}

/// 宿主控件接口
///
/// 属性是动态的，按字符串名称访问。实现方通过内部可变性修改属性，
/// 因此 setter 只需要 `&self`。
pub trait Widget {
    /// 控件名称（动画键的一部分）
    fn name(&self) -> &str;

    /// 获取属性的当前值
    ///
    /// # 返回
    /// - `Some(value)`: 属性存在
    /// - `None`: 属性不存在
    fn get_property(&self, property_id: &str) -> Option<PropertyValue>;

    /// 设置属性的新值
    ///
    /// # 返回
    /// - `true`: 设置成功
    /// - `false`: 控件拒绝了此属性
    fn set_property(&self, property_id: &str, value: PropertyValue) -> bool;
}

/// 序列控件（分步动画播放）
pub trait SequencePlayer {
    /// 播放全部步骤
    fn play_all(&self);

    /// 播放下一步
    fn play_next(&self);
}

/// 控件解析
pub trait Scene {
    /// 按名称查找控件
    fn widget(&self, name: &str) -> Option<Rc<dyn Widget>>;

    /// 按 ID 查找序列播放器
    fn sequence(&self, _id: &str) -> Option<Rc<dyn SequencePlayer>> {
        None
    }
}

/// 控件标识
///
/// 名称会经过 [`Scene`] 解析；已解析的控件原样使用。
/// 切换类操作在内部把已解析的控件再传给其它操作，两种形式都必须接受。
#[derive(Clone)]
pub enum Target {
    /// 控件名称
    Name(String),
    /// 已解析的控件
    Widget(Rc<dyn Widget>),
}

impl Target {
    /// 用于日志的描述
    pub fn description(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Widget(widget) => widget.name(),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Widget(widget) => f.debug_tuple("Widget").field(&widget.name()).finish(),
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for Target {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<Rc<dyn Widget>> for Target {
    fn from(widget: Rc<dyn Widget>) -> Self {
        Self::Widget(widget)
    }
}

impl From<&Rc<dyn Widget>> for Target {
    fn from(widget: &Rc<dyn Widget>) -> Self {
        Self::Widget(widget.clone())
    }
}

impl From<Rc<SceneWidget>> for Target {
    fn from(widget: Rc<SceneWidget>) -> Self {
        Self::Widget(widget)
    }
}

impl From<&Rc<SceneWidget>> for Target {
    fn from(widget: &Rc<SceneWidget>) -> Self {
        Self::Widget(widget.clone())
    }
}

/// 内存控件
///
/// 接受任意属性名。新建时带有宿主控件的默认属性：
/// `color = ""`、`opacity = 1`、`scale = 1`、`visible = true`、`src = ""`。
pub struct SceneWidget {
    name: String,
    properties: RefCell<HashMap<String, PropertyValue>>,
    writes: RefCell<Vec<(String, PropertyValue)>>,
}

impl fmt::Debug for SceneWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneWidget")
            .field("name", &self.name)
            .field("properties", &self.properties.borrow().len())
            .finish()
    }
}

impl SceneWidget {
    /// 创建带默认属性的控件
    pub fn new(name: impl Into<String>) -> Self {
        let mut properties = HashMap::new();
        properties.insert(props::COLOR.to_string(), PropertyValue::empty());
        properties.insert(props::OPACITY.to_string(), PropertyValue::Number(1.0));
        properties.insert(props::SCALE.to_string(), PropertyValue::Number(1.0));
        properties.insert(props::VISIBLE.to_string(), PropertyValue::Bool(true));
        properties.insert(props::SRC.to_string(), PropertyValue::empty());

        Self {
            name: name.into(),
            properties: RefCell::new(properties),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// 设置初始属性（构建时使用）
    pub fn with(self, property_id: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties
            .borrow_mut()
            .insert(property_id.to_string(), value.into());
        self
    }

    /// 读取数值属性
    pub fn number(&self, property_id: &str) -> Option<f64> {
        self.get_property(property_id)?.as_number()
    }

    /// 读取布尔属性
    pub fn flag(&self, property_id: &str) -> Option<bool> {
        self.get_property(property_id)?.as_bool()
    }

    /// 读取字符串属性
    pub fn text(&self, property_id: &str) -> Option<String> {
        self.get_property(property_id)?
            .as_text()
            .map(str::to_string)
    }

    /// 某个属性被写入的次数
    pub fn write_count(&self, property_id: &str) -> usize {
        self.writes
            .borrow()
            .iter()
            .filter(|(p, _)| p == property_id)
            .count()
    }

    /// 某个属性的写入历史
    pub fn writes_of(&self, property_id: &str) -> Vec<PropertyValue> {
        self.writes
            .borrow()
            .iter()
            .filter(|(p, _)| p == property_id)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl Widget for SceneWidget {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, property_id: &str) -> Option<PropertyValue> {
        self.properties.borrow().get(property_id).cloned()
    }

    fn set_property(&self, property_id: &str, value: PropertyValue) -> bool {
        self.writes
            .borrow_mut()
            .push((property_id.to_string(), value.clone()));
        self.properties
            .borrow_mut()
            .insert(property_id.to_string(), value);
        true
    }
}

/// 内存场景
#[derive(Default)]
pub struct SceneGraph {
    widgets: RefCell<HashMap<String, Rc<SceneWidget>>>,
    sequences: RefCell<HashMap<String, Rc<dyn SequencePlayer>>>,
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("widgets", &self.widgets.borrow().len())
            .field("sequences", &self.sequences.borrow().len())
            .finish()
    }
}

impl SceneGraph {
    /// 创建空场景
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加控件，同名控件会被替换
    pub fn add(&self, widget: SceneWidget) -> Rc<SceneWidget> {
        let widget = Rc::new(widget);
        self.widgets
            .borrow_mut()
            .insert(widget.name().to_string(), widget.clone());
        widget
    }

    /// 添加序列播放器
    pub fn add_sequence(&self, id: impl Into<String>, player: Rc<dyn SequencePlayer>) {
        self.sequences.borrow_mut().insert(id.into(), player);
    }

    /// 获取具体类型的控件
    pub fn get(&self, name: &str) -> Option<Rc<SceneWidget>> {
        self.widgets.borrow().get(name).cloned()
    }

    /// 移除控件
    pub fn remove(&self, name: &str) -> Option<Rc<SceneWidget>> {
        self.widgets.borrow_mut().remove(name)
    }
}

impl Scene for SceneGraph {
    fn widget(&self, name: &str) -> Option<Rc<dyn Widget>> {
        self.widgets
            .borrow()
            .get(name)
            .map(|w| w.clone() as Rc<dyn Widget>)
    }

    fn sequence(&self, id: &str) -> Option<Rc<dyn SequencePlayer>> {
        self.sequences.borrow().get(id).cloned()
    }
}
