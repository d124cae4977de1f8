//! # Color 模块
//!
//! HSL → RGB 转换，以及宿主使用的 CSS `rgba()` 颜色字符串。

/// RGB 颜色（每通道 0-255）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// 创建颜色
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 宿主控件 `color` 属性接受的格式：`rgba(r, g, b, 1)`
    pub fn to_css(&self) -> String {
        css_rgba(self.r, self.g, self.b)
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(c: Rgb) -> Self {
        (c.r, c.g, c.b)
    }
}

/// 格式化不透明的 CSS 颜色
pub fn css_rgba(r: u8, g: u8, b: u8) -> String {
    format!("rgba({}, {}, {}, 1)", r, g, b)
}

/// HSL 转 RGB
///
/// `h`、`s`、`l` 取值 [0, 1]，输出各通道四舍五入到 [0, 255]。
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let (r, g, b) = if s == 0.0 {
        // 无彩色
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    };

    Rgb::new(to_byte(r), to_byte(g), to_byte(b))
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_byte(channel: f64) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_achromatic() {
        for l in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let c = hsl_to_rgb(0.7, 0.0, l);
            let v = (l * 255.0_f64).round() as u8;
            assert_eq!(c, Rgb::new(v, v, v));
        }
        assert_eq!(hsl_to_rgb(0.0, 0.0, 0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn test_primary_colors() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_light_and_dark() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 1.0), Rgb::new(255, 255, 255));
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.0), Rgb::new(0, 0, 0));
        // l >= 0.5 走 q = l + s - l*s 分支
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.75), Rgb::new(255, 128, 128));
    }

    #[test]
    fn test_hue_wraps() {
        // h = 1 与 h = 0 同为红色
        assert_eq!(hsl_to_rgb(1.0, 1.0, 0.5), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_css() {
        assert_eq!(Rgb::new(255, 0, 0).to_css(), "rgba(255, 0, 0, 1)");
        assert_eq!(css_rgba(1, 2, 3), "rgba(1, 2, 3, 1)");
    }
}
