use eggteto::presentation::{
    self, BarAnchor, ConfidenceBar, ResultView, Style, Theme, render_state, share_text,
};
use eggteto::{AnalysisResult, Classification, EggtetoError, SessionState};

fn result(classification: Classification, confidence: i64) -> AnalysisResult {
    AnalysisResult::new(
        classification,
        confidence,
        "매끈한 삶은 달걀",
        "이마부터 턱까지 곡선이 부드럽게 이어집니다.",
        vec!["시스루뱅".to_string(), "C컬 펌".to_string()],
        vec!["아이유".to_string(), "박보영".to_string()],
    )
    .unwrap()
}

#[test]
fn eggen_is_warm_and_left_anchored() {
    let r = result(Classification::Eggen, 73);
    let view = ResultView::new(&r, 24);
    assert_eq!(view.theme(), Theme::Warm);
    assert_eq!(view.bar().anchor, BarAnchor::Left);
    assert_eq!(view.badge(), "EGGEN TYPE");
    assert_eq!(view.headline(), "당신은 73% 에겐 입니다");
}

#[test]
fn theme_depends_only_on_classification() {
    let low = result(Classification::Teto, 51);
    let high = result(Classification::Teto, 99);
    assert_eq!(ResultView::new(&low, 24).theme(), ResultView::new(&high, 24).theme());
    assert_eq!(Theme::for_classification(Classification::Unknown), Theme::Neutral);
}

#[test]
fn bar_width_is_configurable() {
    let r = result(Classification::Eggen, 50);
    assert_eq!(ResultView::new(&r, 10).bar(), ConfidenceBar::new(50, 10, BarAnchor::Left));
    assert_eq!(ResultView::new(&r, 10).bar().cells().chars().count(), 10);
}

#[test]
fn rendered_result_lists_everything_in_order() {
    let r = result(Classification::Eggen, 73);
    let text = ResultView::new(&r, 24).render(Style::Plain);

    assert!(text.contains("[EGGEN TYPE]"));
    assert!(text.contains("매끈한 삶은 달걀"));
    assert!(text.contains("이마부터 턱까지"));
    let first = text.find("1. 시스루뱅").unwrap();
    let second = text.find("2. C컬 펌").unwrap();
    assert!(first < second);
    assert!(text.contains("1. 아이유"));
    assert!(text.contains("2. 박보영"));
    assert!(!text.contains('\x1b'));
}

#[test]
fn ansi_render_uses_theme_accent() {
    let r = result(Classification::Teto, 80);
    let text = ResultView::new(&r, 24).render(Style::Ansi);
    assert!(text.contains(Theme::Cool.accent()));
    assert!(!text.contains(Theme::Warm.accent()));
}

#[test]
fn each_state_renders() {
    let idle = render_state(&SessionState::Idle, Style::Plain, 24);
    assert!(idle.contains("에겐"));
    assert!(idle.contains("테토"));

    let loading = render_state(&SessionState::Pending, Style::Plain, 24);
    assert!(loading.contains("분석 중"));

    let done = render_state(
        &SessionState::Succeeded(result(Classification::Eggen, 73)),
        Style::Plain,
        24,
    );
    assert!(done.contains("73%"));

    let failed = render_state(
        &SessionState::Failed(EggtetoError::MalformedResponse("trailing comma".into())),
        Style::Plain,
        24,
    );
    assert!(failed.contains(eggteto::error::ANALYSIS_FAILED_MESSAGE));
    assert!(!failed.contains("trailing comma"));
}

#[test]
fn loading_view_is_stable() {
    assert_eq!(
        presentation::render_loading(Style::Plain),
        render_state(&SessionState::Pending, Style::Plain, 24)
    );
}

#[test]
fn share_text_summarizes_result() {
    let text = share_text(&result(Classification::Eggen, 73));
    assert!(text.starts_with("나는 73% 에겐!"));
    assert!(text.contains("\"매끈한 삶은 달걀\""));
    assert!(text.contains("아이유, 박보영"));
    assert!(text.ends_with("#에겐테토"));
}
