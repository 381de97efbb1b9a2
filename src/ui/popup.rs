//! Info popup for the selected marker

use crate::state::store::{Marker, MarkerId};
use chrono::{DateTime, Utc};
use egui::{Align, Align2, Color32, Layout, Rect, RichText, Stroke};

#[derive(Debug, Clone)]
pub struct PopupStyle {
    pub background_color: Color32,
    pub border_color: Color32,
    pub border_width: f32,
    pub rounding: f32,
    pub padding: f32,
    pub title_color: Color32,
    pub text_color: Color32,
    pub muted_color: Color32,
    pub max_width: f32,
}

impl Default for PopupStyle {
    fn default() -> Self {
        Self {
            background_color: Color32::WHITE,
            border_color: Color32::GRAY,
            border_width: 1.0,
            rounding: 4.0,
            padding: 8.0,
            title_color: Color32::BLACK,
            text_color: Color32::from_gray(40),
            muted_color: Color32::from_gray(110),
            max_width: 240.0,
        }
    }
}

/// Formats the age of `then` as seen at `now`, e.g. "2 minutes ago".
///
/// Units are floored. Anything under a minute, and timestamps in the
/// future, collapse to a fixed phrase.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 0 {
        return "just now".to_string();
    }

    let (amount, unit) = match seconds {
        0..=59 => return "less than a minute ago".to_string(),
        60..=3_599 => (seconds / 60, "minute"),
        3_600..=86_399 => (seconds / 3_600, "hour"),
        _ => (seconds / 86_400, "day"),
    };

    if amount == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", amount, unit)
    }
}

/// What happened to a popup this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupResponse {
    pub closed: bool,
    /// Screen rect of the close button
    pub close_button: Rect,
}

/// Text of a marker popup, computed at render time
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPopup {
    pub marker_id: MarkerId,
    pub title: String,
    pub body: String,
    pub verified: String,
}

impl MarkerPopup {
    pub fn for_marker(marker: &Marker, now: DateTime<Utc>) -> Self {
        Self {
            marker_id: marker.id,
            title: "Film spot".to_string(),
            body: "This is a good place to shoot!".to_string(),
            verified: format!("Verified {}", format_relative(marker.created_at, now)),
        }
    }

    /// Draws the popup with its bottom edge centred on `anchor`
    pub fn show(&self, ctx: &egui::Context, anchor: egui::Pos2, style: &PopupStyle) -> PopupResponse {
        let mut response = PopupResponse {
            closed: false,
            close_button: Rect::NOTHING,
        };

        egui::Area::new(egui::Id::new(("marker_popup", self.marker_id.0)))
            .order(egui::Order::Foreground)
            .fixed_pos(anchor)
            .pivot(Align2::CENTER_BOTTOM)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(style.background_color)
                    .stroke(Stroke::new(style.border_width, style.border_color))
                    .rounding(style.rounding)
                    .inner_margin(style.padding)
                    .show(ui, |ui| {
                        ui.set_max_width(style.max_width);
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(&self.title).strong().color(style.title_color));
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                let close = ui.small_button("✕");
                                response.close_button = close.rect;
                                response.closed = close.clicked();
                            });
                        });
                        ui.label(RichText::new(&self.body).color(style.text_color));
                        ui.label(RichText::new(&self.verified).small().color(style.muted_color));
                    });
            });

        response
    }
}
