use crate::core::constants::MARKER_ICON_SIZE;
use crate::ui::popup::PopupStyle;
use egui::{Color32, FontId, Stroke};

/// Style configuration for the map view
#[derive(Debug, Clone)]
pub struct MapStyle {
    /// Background color where no tile has loaded yet
    pub background_color: Color32,
    /// Faint tile grid drawn over missing tiles
    pub grid_stroke: Stroke,
    pub zoom_controls: ZoomControlStyle,
    pub attribution: AttributionStyle,
    pub markers: MarkerStyle,
    pub popup: PopupStyle,
}

/// Style for the zoom buttons
#[derive(Debug, Clone)]
pub struct ZoomControlStyle {
    pub background_color: Color32,
    pub text_color: Color32,
    pub border_stroke: Stroke,
    pub button_size: f32,
    /// Margin from the bottom-right corner
    pub margin: f32,
    pub rounding: f32,
}

/// Style for attribution text
#[derive(Debug, Clone)]
pub struct AttributionStyle {
    pub text_color: Color32,
    pub background_color: Color32,
    pub font_id: FontId,
    pub padding: f32,
}

/// Style for the clapperboard marker glyph
#[derive(Debug, Clone)]
pub struct MarkerStyle {
    pub size: f32,
    pub board_color: Color32,
    pub stripe_color: Color32,
    pub outline: Stroke,
    /// Outline of the marker whose popup is open
    pub selected_outline: Stroke,
    pub hover_outline: Stroke,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            background_color: Color32::from_rgb(236, 233, 226),
            grid_stroke: Stroke::new(1.0, Color32::from_rgb(222, 218, 210)),
            zoom_controls: ZoomControlStyle::default(),
            attribution: AttributionStyle::default(),
            markers: MarkerStyle::default(),
            popup: PopupStyle::default(),
        }
    }
}

impl Default for ZoomControlStyle {
    fn default() -> Self {
        Self {
            background_color: Color32::WHITE,
            text_color: Color32::from_gray(60),
            border_stroke: Stroke::new(1.0, Color32::from_gray(190)),
            button_size: 30.0,
            margin: 12.0,
            rounding: 2.0,
        }
    }
}

impl Default for AttributionStyle {
    fn default() -> Self {
        Self {
            text_color: Color32::from_gray(60),
            background_color: Color32::from_rgba_unmultiplied(255, 255, 255, 190),
            font_id: FontId::proportional(10.0),
            padding: 3.0,
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            size: MARKER_ICON_SIZE,
            board_color: Color32::from_rgb(33, 33, 33),
            stripe_color: Color32::WHITE,
            outline: Stroke::new(1.0, Color32::from_gray(250)),
            selected_outline: Stroke::new(2.0, Color32::from_rgb(244, 180, 0)),
            hover_outline: Stroke::new(2.0, Color32::from_rgb(120, 170, 255)),
        }
    }
}
