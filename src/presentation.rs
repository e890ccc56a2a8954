//! Terminal rendering of session states.
//!
//! Everything here is a pure function of its input. The theme is chosen
//! by classification alone.

use std::fmt::Write as _;

use crate::controller::SessionState;
use crate::types::{AnalysisResult, Classification};
use crate::EggtetoError;

/// Confidence bar width in cells.
pub const DEFAULT_BAR_WIDTH: usize = 24;

/// Widest bar that will be drawn; wider requests are clamped.
pub const MAX_BAR_WIDTH: usize = 200;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Output styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Ansi,
}

impl Style {
    fn paint(self, code: &str, text: &str) -> String {
        match self {
            Style::Plain => text.to_string(),
            Style::Ansi => format!("{code}{text}{RESET}"),
        }
    }
}

/// Accent palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// Warm yellow/orange.
    Warm,
    /// Cool blue/indigo.
    Cool,
    /// Grey, for results the service could not classify.
    Neutral,
}

impl Theme {
    pub fn for_classification(classification: Classification) -> Self {
        match classification {
            Classification::Eggen => Theme::Warm,
            Classification::Teto => Theme::Cool,
            Classification::Unknown => Theme::Neutral,
        }
    }

    /// ANSI 256-color foreground code for the accent.
    pub fn accent(self) -> &'static str {
        match self {
            Theme::Warm => "\x1b[38;5;208m",
            Theme::Cool => "\x1b[38;5;62m",
            Theme::Neutral => "\x1b[38;5;245m",
        }
    }
}

/// Which end of the bar the fill grows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarAnchor {
    Left,
    Right,
}

/// Confidence as a fraction of a fixed-width bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceBar {
    pub width: usize,
    pub filled: usize,
    pub anchor: BarAnchor,
}

impl ConfidenceBar {
    /// Map `confidence` (0..=100) onto `width` cells, rounding to nearest.
    ///
    /// `width` is clamped to [`MAX_BAR_WIDTH`].
    pub fn new(confidence: u8, width: usize, anchor: BarAnchor) -> Self {
        let width = width.min(MAX_BAR_WIDTH);
        let confidence = usize::from(confidence.min(100));
        Self {
            width,
            filled: (confidence * width + 50) / 100,
            anchor,
        }
    }

    pub fn cells(&self) -> String {
        let filled = "█".repeat(self.filled);
        let empty = "░".repeat(self.width - self.filled);
        match self.anchor {
            BarAnchor::Left => format!("{filled}{empty}"),
            BarAnchor::Right => format!("{empty}{filled}"),
        }
    }
}

/// Display model for one result.
#[derive(Debug, Clone)]
pub struct ResultView<'a> {
    result: &'a AnalysisResult,
    theme: Theme,
    bar: ConfidenceBar,
}

impl<'a> ResultView<'a> {
    pub fn new(result: &'a AnalysisResult, bar_width: usize) -> Self {
        let anchor = match result.classification() {
            Classification::Teto => BarAnchor::Right,
            _ => BarAnchor::Left,
        };
        Self {
            result,
            theme: Theme::for_classification(result.classification()),
            bar: ConfidenceBar::new(result.confidence(), bar_width, anchor),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn bar(&self) -> ConfidenceBar {
        self.bar
    }

    pub fn badge(&self) -> String {
        format!("{} TYPE", self.result.classification().as_str().to_uppercase())
    }

    pub fn headline(&self) -> String {
        match self.result.classification() {
            Classification::Unknown => "얼굴형을 판별하지 못했어요".to_string(),
            c => format!("당신은 {}% {} 입니다", self.result.confidence(), c.label()),
        }
    }

    pub fn styling_tips(&self) -> &[String] {
        self.result.styling_tips()
    }

    pub fn lookalikes(&self) -> &[String] {
        self.result.lookalikes()
    }

    pub fn render(&self, style: Style) -> String {
        let accent = self.theme.accent();
        let mut out = String::new();

        let _ = writeln!(out, "{}", style.paint(DIM, &format!("[{}]", self.badge())));
        let _ = writeln!(out, "{}", style.paint(BOLD, self.result.title()));
        let _ = writeln!(out, "{}", style.paint(accent, &self.headline()));
        let _ = writeln!(
            out,
            "🥚 에겐 {} 🗿 테토",
            style.paint(accent, &self.bar.cells())
        );
        out.push('\n');
        let _ = writeln!(out, "{}", self.result.description());
        out.push('\n');

        let _ = writeln!(out, "{}", style.paint(accent, "✂ 스타일링 팁"));
        write_numbered(&mut out, self.styling_tips());
        out.push('\n');

        let _ = writeln!(out, "{}", style.paint(accent, "👤 닮은꼴 연예인"));
        write_numbered(&mut out, self.lookalikes());
        out.push('\n');

        let _ = writeln!(
            out,
            "{}",
            style.paint(DIM, "retry: 다시 하기 · share: 결과 공유하기")
        );
        out
    }
}

fn write_numbered(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str("  -\n");
        return;
    }
    for (idx, item) in items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {item}", idx + 1);
    }
}

/// Landing view shown while waiting for an image.
pub fn render_idle(style: Style) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} vs {}",
        style.paint(Theme::Warm.accent(), "에겐"),
        style.paint(Theme::Cool.accent(), "테토")
    );
    out.push_str("내 얼굴은 매끈한 달걀형일까요? 아니면 엣지있는 테토형일까요?\n");
    out.push_str("얼굴이 잘 나온 사진의 경로를 입력하거나 여기로 끌어다 놓으세요.\n");
    let _ = writeln!(
        out,
        "{}",
        style.paint(DIM, "🔒 사진은 저장되지 않고 분석 후 즉시 삭제됩니다.")
    );
    out
}

/// Loading overlay.
pub fn render_loading(style: Style) -> String {
    format!(
        "{}\n{}\n",
        style.paint(BOLD, "AI가 얼굴을 분석 중입니다..."),
        style.paint(DIM, "에겐일까요? 테토일까요?")
    )
}

/// Dismissible error banner. Shows the localized message only.
pub fn render_error(error: &EggtetoError, style: Style) -> String {
    format!(
        "{} {}\n{}\n",
        style.paint("\x1b[31m", "⚠"),
        error.user_message(),
        style.paint(DIM, "dismiss: 닫기")
    )
}

/// Render whatever state the session is in.
pub fn render_state(state: &SessionState, style: Style, bar_width: usize) -> String {
    match state {
        SessionState::Idle => render_idle(style),
        SessionState::Pending => render_loading(style),
        SessionState::Succeeded(result) => ResultView::new(result, bar_width).render(style),
        SessionState::Failed(error) => render_error(error, style),
    }
}

/// Plain-text summary for sharing a result.
pub fn share_text(result: &AnalysisResult) -> String {
    let mut out = match result.classification() {
        Classification::Unknown => format!("\"{}\"", result.title()),
        c => format!("나는 {}% {}! \"{}\"", result.confidence(), c.label(), result.title()),
    };
    if !result.lookalikes().is_empty() {
        let _ = write!(out, "\n닮은꼴: {}", result.lookalikes().join(", "));
    }
    out.push_str("\n#에겐테토");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_rounds_to_nearest_cell() {
        assert_eq!(ConfidenceBar::new(0, 24, BarAnchor::Left).filled, 0);
        assert_eq!(ConfidenceBar::new(100, 24, BarAnchor::Left).filled, 24);
        assert_eq!(ConfidenceBar::new(50, 24, BarAnchor::Left).filled, 12);
        // 73% of 24 = 17.52
        assert_eq!(ConfidenceBar::new(73, 24, BarAnchor::Left).filled, 18);
    }

    #[test]
    fn oversized_bar_is_clamped() {
        let bar = ConfidenceBar::new(100, usize::MAX / 50, BarAnchor::Left);
        assert_eq!(bar.width, MAX_BAR_WIDTH);
        assert_eq!(bar.filled, MAX_BAR_WIDTH);
        assert_eq!(bar.cells().chars().count(), MAX_BAR_WIDTH);
    }

    #[test]
    fn bar_cells_respect_anchor() {
        let left = ConfidenceBar::new(50, 4, BarAnchor::Left).cells();
        let right = ConfidenceBar::new(50, 4, BarAnchor::Right).cells();
        assert_eq!(left, "██░░");
        assert_eq!(right, "░░██");
    }

    #[test]
    fn plain_style_has_no_escapes() {
        let error = EggtetoError::EmptyResponse;
        assert!(!render_error(&error, Style::Plain).contains('\x1b'));
        assert!(render_error(&error, Style::Ansi).contains('\x1b'));
    }

    #[test]
    fn error_banner_hides_detail() {
        let error = EggtetoError::ServiceUnavailable("secret upstream detail".into());
        let text = render_error(&error, Style::Plain);
        assert!(!text.contains("secret upstream detail"));
        assert!(text.contains(crate::error::ANALYSIS_FAILED_MESSAGE));
    }
}
