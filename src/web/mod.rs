//! Browser glue: binds the page's canvas, controls and text input to a `Session`,
//! loads the data files and drives the `requestAnimationFrame` loop.
//!
//! The page provides the elements listed below by id. The on-screen keyboard
//! elements are optional.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    BeforeUnloadEvent, Document, Event, HtmlButtonElement, HtmlCanvasElement, HtmlElement,
    HtmlInputElement, HtmlSelectElement, KeyboardEvent, Window, window,
};

use crate::config::GameConfig;
use crate::game::theme::Theme;
use crate::game::{InputOutcome, LoopControl, Session};

pub mod canvas;
pub mod loader;

use canvas::CanvasSurface;

const CANVAS_ID: &str = "gameCanvas";
const CONTAINER_ID: &str = "gameContainer";
const TEXT_INPUT_ID: &str = "textInput";
const CURRENT_INPUT_ID: &str = "currentInput";
const SCORE_ID: &str = "score";
const THEME_SELECT_ID: &str = "themeSelect";
const START_ID: &str = "startButton";
const PAUSE_ID: &str = "pauseButton";
const END_ID: &str = "endButton";
const KEYBOARD_ID: &str = "virtualKeyboard";
const KEYBOARD_TOGGLE_ID: &str = "toggleKeyboard";

// Two taps closer than this are a double tap; the second one is swallowed so
// mobile browsers don't zoom.
const DOUBLE_TAP_MS: f64 = 300.0;

const KEYBOARD_KEYS: [&str; 30] = [
    "Й", "Ц", "У", "К", "Е", "Н", "Г", "Ш", "Щ", "З", //
    "Ф", "Ы", "В", "А", "П", "Р", "О", "Л", "Д", "Ж", //
    "Я", "Ч", "С", "М", "И", "Т", "Ь", "Б", "Ю", "Х",
];

/// Page elements the game writes to.
struct Dom {
    text_input: HtmlInputElement,
    current_input: HtmlElement,
    score: HtmlElement,
    start_button: HtmlButtonElement,
    pause_button: HtmlButtonElement,
}

impl Dom {
    fn clear_input(&self) {
        self.text_input.set_value("");
        self.current_input.set_text_content(Some(""));
    }
}

struct WebGame {
    session: Session,
    surface: CanvasSurface,
    dom: Dom,
    loop_running: bool,
}

impl WebGame {
    fn is_playing(&self) -> bool {
        self.session.is_started() && !self.session.is_paused()
    }

    fn frame(&mut self, now: f64) -> LoopControl {
        let (control, report) = self.session.frame(now);
        if control == LoopControl::Halt {
            self.loop_running = false;
            return control;
        }
        if let Some(image) = &report.spawned {
            self.surface.images.ensure(image);
        }
        if report.missed {
            log::debug!("target missed, score now {}", self.session.score());
        }
        self.draw();
        control
    }

    fn draw(&mut self) {
        self.session.render(&mut self.surface);
        self.dom.score.set_text_content(Some(&self.session.readout()));
    }

    // Shared tail of "end" and theme change.
    fn reset_view(&mut self) {
        self.dom.clear_input();
        self.draw();
        let label = if self.session.is_loaded() { "Старт" } else { "Загрузка..." };
        self.dom.start_button.set_text_content(Some(label));
        self.dom.pause_button.set_text_content(Some("Пауза"));
    }

    fn resize_to(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.session.resize(width as f64, height as f64);
    }
}

thread_local! {
    static GAME: RefCell<Option<WebGame>> = RefCell::new(None);
    static FRAME: RefCell<Option<Closure<dyn FnMut(f64)>>> = RefCell::new(None);
}

/// Runs `f` against the game state. Never call back into the DOM in ways that
/// dispatch events (focus, dispatch_event) from inside `f`.
fn with_game<R>(f: impl FnOnce(&mut WebGame) -> R) -> Option<R> {
    GAME.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn element<T: JsCast>(doc: &Document, id: &str) -> Result<T, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has an unexpected type")))
}

fn to_js(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{e:#}"))
}

#[wasm_bindgen]
pub fn start_game(config_json: Option<String>) -> Result<(), JsValue> {
    let cfg = match config_json.as_deref() {
        Some(json) => GameConfig::from_json(json).map_err(to_js)?,
        None => GameConfig::default(),
    };
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas: HtmlCanvasElement = element(&doc, CANVAS_ID)?;
    let dom = Dom {
        text_input: element(&doc, TEXT_INPUT_ID)?,
        current_input: element(&doc, CURRENT_INPUT_ID)?,
        score: element(&doc, SCORE_ID)?,
        start_button: element(&doc, START_ID)?,
        pause_button: element(&doc, PAUSE_ID)?,
    };
    dom.start_button.set_disabled(true);
    dom.start_button.set_text_content(Some("Загрузка..."));

    let mut session = Session::with_entropy(cfg.clone());
    let theme_select: HtmlSelectElement = element(&doc, THEME_SELECT_ID)?;
    if let Ok(theme) = theme_select.value().parse::<Theme>() {
        session.set_theme(theme);
    }

    let game = WebGame {
        session,
        surface: CanvasSurface::new(canvas.clone())?,
        dom,
        loop_running: false,
    };
    GAME.with(|g| g.replace(Some(game)));

    install_frame_callback();
    resize_canvas(&doc);
    wire_resize(&win)?;
    wire_controls(&doc, &theme_select)?;
    wire_text_input(&doc, &canvas)?;
    wire_virtual_keyboard(&doc)?;
    wire_page_guards(&win, &doc)?;

    wasm_bindgen_futures::spawn_local(async move {
        match loader::load_datasets(&cfg).await {
            Ok(data) => {
                with_game(|g| {
                    g.session.load(data);
                    g.dom.start_button.set_disabled(false);
                    g.dom.start_button.set_text_content(Some("Старт"));
                });
            }
            Err(e) => {
                log::error!("data load failed: {e:#}");
                alert(&format!(
                    "Не удалось загрузить данные: {e}\nПроверьте наличие файлов: {}, {}, {}",
                    cfg.capitals_url, cfg.names_url, cfg.mapping_url
                ));
            }
        }
    });
    Ok(())
}

// --- Frame loop ---------------------------------------------------------------

fn install_frame_callback() {
    let cb = Closure::wrap(Box::new(move |ts: f64| {
        if with_game(|g| g.frame(ts)) == Some(LoopControl::Continue) {
            request_frame();
        }
    }) as Box<dyn FnMut(f64)>);
    FRAME.with(|slot| slot.replace(Some(cb)));
}

fn request_frame() {
    FRAME.with(|slot| {
        if let (Some(cb), Some(w)) = (slot.borrow().as_ref(), window()) {
            if let Err(e) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame failed: {:?}", e);
                with_game(|g| g.loop_running = false);
            }
        }
    });
}

/// Enters the frame loop unless it is already scheduled.
fn ensure_loop() {
    let was_running = with_game(|g| std::mem::replace(&mut g.loop_running, true)).unwrap_or(true);
    if !was_running {
        request_frame();
    }
}

// --- DOM wiring ---------------------------------------------------------------

fn listen(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// Sizes the canvas to its container, or keeps the canvas's own size when the
// page has no container. The session is told the size either way.
fn resize_canvas(doc: &Document) {
    let container = doc.get_element_by_id(CONTAINER_ID);
    if container.is_none() {
        log::warn!("missing element #{CONTAINER_ID}, canvas keeps its size");
    }
    with_game(|g| {
        let (width, height) = match &container {
            Some(c) => {
                let rect = c.get_bounding_client_rect();
                (rect.width() as u32, rect.height() as u32)
            }
            None => (g.surface.canvas.width(), g.surface.canvas.height()),
        };
        g.resize_to(width, height);
        g.draw();
    });
}

fn wire_resize(win: &Window) -> Result<(), JsValue> {
    listen(win, "resize", move |_: Event| {
        if let Some(doc) = window().and_then(|w| w.document()) {
            resize_canvas(&doc);
        }
    })
}

fn wire_controls(doc: &Document, theme_select: &HtmlSelectElement) -> Result<(), JsValue> {
    {
        let select = theme_select.clone();
        listen(theme_select, "change", move |_: Event| {
            match select.value().parse::<Theme>() {
                Ok(theme) => {
                    with_game(|g| {
                        g.session.set_theme(theme);
                        g.reset_view();
                    });
                }
                Err(e) => log::warn!("{e}"),
            }
        })?;
    }

    let start: HtmlButtonElement = element(doc, START_ID)?;
    {
        let button = start.clone();
        listen(&start, "click", move |_: Event| {
            match with_game(|g| g.session.start()) {
                Some(Ok(())) => {
                    button.set_text_content(Some("Возобновить"));
                    with_game(|g| g.dom.pause_button.set_text_content(Some("Пауза")));
                    ensure_loop();
                    focus_text_input();
                }
                Some(Err(e)) => alert(&e.to_string()),
                None => {}
            }
        })?;
    }

    let pause: HtmlButtonElement = element(doc, PAUSE_ID)?;
    listen(&pause, "click", move |_: Event| {
        let resume = with_game(|g| {
            let paused = g.session.toggle_pause();
            if paused {
                g.dom.clear_input();
                g.dom.pause_button.set_text_content(Some("Продолжить"));
            } else {
                g.dom.pause_button.set_text_content(Some("Пауза"));
            }
            !paused && g.session.is_started()
        });
        if resume == Some(true) {
            focus_text_input();
            ensure_loop();
        }
    })?;

    let end: HtmlButtonElement = element(doc, END_ID)?;
    listen(&end, "click", move |_: Event| {
        with_game(|g| {
            g.session.end_game();
            g.reset_view();
        });
    })
}

fn wire_text_input(doc: &Document, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let input: HtmlInputElement = element(doc, TEXT_INPUT_ID)?;

    {
        let field = input.clone();
        listen(&input, "input", move |_: Event| {
            let value = field.value();
            let outcome = with_game(|g| {
                let outcome = g.session.on_input(&value);
                if outcome != InputOutcome::Ignored {
                    g.dom.current_input.set_text_content(Some(g.session.input()));
                    if matches!(outcome, InputOutcome::Rejected | InputOutcome::Matched) {
                        g.dom.text_input.set_value("");
                    }
                }
                outcome
            });
            if let Some(outcome) = outcome {
                haptic(outcome);
            }
        })?;
    }

    listen(&input, "keydown", move |evt: Event| {
        let is_enter = evt
            .dyn_ref::<KeyboardEvent>()
            .is_some_and(|k| k.key() == "Enter");
        if !is_enter {
            return;
        }
        evt.prevent_default();
        let outcome = with_game(|g| {
            let outcome = g.session.submit();
            if outcome == InputOutcome::Matched {
                g.dom.clear_input();
            }
            outcome
        });
        if let Some(outcome) = outcome {
            haptic(outcome);
        }
    })?;

    // Keep focus on the input while playing.
    listen(&input, "blur", move |_: Event| {
        if with_game(|g| g.is_playing()) != Some(true) {
            return;
        }
        let refocus = Closure::once_into_js(move || {
            if with_game(|g| g.is_playing()) == Some(true) {
                focus_text_input();
            }
        });
        if let Some(w) = window() {
            if let Err(e) = w.set_timeout_with_callback_and_timeout_and_arguments_0(
                refocus.unchecked_ref(),
                100,
            ) {
                log::error!("setTimeout failed: {:?}", e);
            }
        }
    })?;

    listen(canvas, "click", move |_: Event| {
        if with_game(|g| g.is_playing()) == Some(true) {
            focus_text_input();
        }
    })
}

fn wire_virtual_keyboard(doc: &Document) -> Result<(), JsValue> {
    let (Some(keyboard), Some(toggle)) = (
        doc.get_element_by_id(KEYBOARD_ID),
        doc.get_element_by_id(KEYBOARD_TOGGLE_ID),
    ) else {
        log::debug!("no on-screen keyboard on this page");
        return Ok(());
    };

    for key in KEYBOARD_KEYS {
        let button = doc.create_element("button")?;
        button.set_class_name("key");
        button.set_text_content(Some(key));
        listen(&button, "click", move |_: Event| {
            edit_text_input(|value| value.push_str(key));
        })?;
        keyboard.append_child(&button)?;
    }

    let backspace = doc.create_element("button")?;
    backspace.set_class_name("key backspace");
    backspace.set_text_content(Some("⌫"));
    listen(&backspace, "click", move |_: Event| {
        edit_text_input(|value| {
            value.pop();
        });
    })?;
    keyboard.append_child(&backspace)?;

    let keyboard: HtmlElement = keyboard.dyn_into()?;
    let toggle_el = toggle.clone();
    listen(&toggle, "click", move |_: Event| {
        let style = keyboard.style();
        let hidden = matches!(style.get_property_value("display").as_deref(), Ok("none") | Ok(""));
        let (display, label) = if hidden {
            ("grid", "Скрыть клавиатуру")
        } else {
            ("none", "Клавиатура")
        };
        style.set_property("display", display).ok();
        toggle_el.set_text_content(Some(label));
    })
}

/// Remembers the last `touchend` time to spot double taps.
#[derive(Debug, Default)]
struct TapGuard {
    last_tap: Option<f64>,
}

impl TapGuard {
    /// Records a tap at `now` (ms) and reports whether it completes a double tap.
    fn is_double_tap(&mut self, now: f64) -> bool {
        let double = self.last_tap.is_some_and(|last| now - last <= DOUBLE_TAP_MS);
        self.last_tap = Some(now);
        double
    }
}

// Blocks double-tap zoom and asks before leaving a running game.
fn wire_page_guards(win: &Window, doc: &Document) -> Result<(), JsValue> {
    let mut taps = TapGuard::default();
    listen(doc, "touchend", move |evt: Event| {
        if taps.is_double_tap(js_sys::Date::now()) {
            evt.prevent_default();
        }
    })?;

    listen(win, "beforeunload", move |evt: Event| {
        if with_game(|g| g.is_playing()) != Some(true) {
            return;
        }
        evt.prevent_default();
        if let Some(unload) = evt.dyn_ref::<BeforeUnloadEvent>() {
            unload.set_return_value("");
        }
    })
}

// Applies an on-screen key press to the text input and replays it as an
// `input` event, the same path a physical keyboard takes.
fn edit_text_input(edit: impl FnOnce(&mut String)) {
    let Some(field) = with_game(|g| g.is_playing().then(|| g.dom.text_input.clone())).flatten() else {
        return;
    };
    let mut value = field.value();
    edit(&mut value);
    field.set_value(&value);
    match Event::new("input") {
        Ok(evt) => {
            field.dispatch_event(&evt).ok();
        }
        Err(e) => log::warn!("could not create input event: {:?}", e),
    }
    field.focus().ok();
}

fn focus_text_input() {
    if let Some(field) = with_game(|g| g.dom.text_input.clone()) {
        field.focus().ok();
    }
}

fn haptic(outcome: InputOutcome) {
    let Some(nav) = window().map(|w| w.navigator()) else {
        return;
    };
    if !js_sys::Reflect::has(&nav, &JsValue::from_str("vibrate")).unwrap_or(false) {
        return;
    }
    match outcome {
        InputOutcome::Rejected => {
            nav.vibrate_with_duration(100);
        }
        InputOutcome::Matched => {
            let pulse = JsValue::from(50);
            let pattern = js_sys::Array::of3(&pulse, &pulse, &pulse);
            nav.vibrate_with_pattern(&pattern);
        }
        InputOutcome::Ignored | InputOutcome::Progress => {}
    }
}

fn alert(message: &str) {
    if let Some(w) = window() {
        w.alert_with_message(message).ok();
    }
}
