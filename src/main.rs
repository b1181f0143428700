//! Flappy Kiro entry point
//!
//! Browser: wires DOM input and Canvas2D drawing to the session controller and
//! drives it from requestAnimationFrame. Native: headless autopilot demo
//! against the in-memory leaderboard.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement};

    use flappy_kiro::events::LogSink;
    use flappy_kiro::platform::HttpLeaderboard;
    use flappy_kiro::session::{LeaderboardView, Screen, SessionController};
    use flappy_kiro::settings::Settings;
    use flappy_kiro::sim::Difficulty;

    const SCREEN_PANELS: [(Screen, &str); 4] = [
        (Screen::Menu, "menu"),
        (Screen::Playing, "hud"),
        (Screen::GameOver, "game-over"),
        (Screen::Leaderboard, "leaderboard"),
    ];

    /// Game instance holding all state
    struct Game {
        controller: SessionController,
        settings: Settings,
        ctx: CanvasRenderingContext2d,
        document: Document,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        last_screen: Option<Screen>,
    }

    impl Game {
        fn update(&mut self, time: f64) {
            if let Some(summary) = self.controller.frame() {
                log::info!("Run over: {} points on {}", summary.score, summary.difficulty);
            }

            if let Some(name) = self.controller.take_accepted_username() {
                self.settings.username = name;
                self.settings.save();
            }

            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Draw the playfield from the engine's read accessors
        fn render(&self) {
            let ctx = &self.ctx;
            let Some(engine) = self.controller.engine() else {
                return;
            };
            let field = engine.playfield();

            ctx.set_fill_style_str("#70c5ce");
            ctx.fill_rect(0.0, 0.0, field.width as f64, field.height as f64);

            let Some(run) = engine.run() else { return };

            ctx.set_fill_style_str("#2e8b57");
            for wall in &run.obstacles {
                for seg in [wall.top_segment(), wall.bottom_segment(field.height)] {
                    ctx.fill_rect(
                        seg.min.x as f64,
                        seg.min.y as f64,
                        seg.width() as f64,
                        seg.height() as f64,
                    );
                }
            }

            let actor = run.actor_bounds();
            ctx.set_fill_style_str("#f7d51d");
            ctx.fill_rect(
                actor.min.x as f64,
                actor.min.y as f64,
                actor.width() as f64,
                actor.height() as f64,
            );
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_visible(&self, id: &str, visible: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.class_list().toggle_with_force("hidden", !visible);
            }
        }

        /// Update overlay panels in DOM
        fn update_hud(&mut self) {
            let screen = self.controller.screen();
            if self.last_screen != Some(screen) {
                for (panel, id) in SCREEN_PANELS {
                    self.set_visible(id, panel == screen);
                }
                if screen == Screen::GameOver {
                    if let Some(input) = self.username_input() {
                        input.set_value(self.controller.username_input());
                    }
                }
                self.last_screen = Some(screen);
            }

            let score = self.controller.score().to_string();
            self.set_text("hud-score", &score);
            self.set_text("final-score", &score);
            self.set_text("difficulty", self.controller.difficulty().as_str());
            self.set_visible("hud-fps", self.settings.show_fps);
            if self.settings.show_fps {
                self.set_text("hud-fps", &self.fps.to_string());
            }

            if screen == Screen::GameOver {
                self.set_text("status", self.controller.status_message().unwrap_or(""));
                if let Some(btn) = self.document.get_element_by_id("submit-btn") {
                    if self.controller.can_submit() {
                        let _ = btn.remove_attribute("disabled");
                    } else {
                        let _ = btn.set_attribute("disabled", "");
                    }
                }
                if self.controller.username_input().is_empty() {
                    if let Some(input) = self.username_input() {
                        if !input.value().is_empty() && !self.controller.is_submitting() {
                            input.set_value("");
                        }
                    }
                }
            }

            if screen == Screen::Leaderboard {
                let text = match self.controller.leaderboard_view() {
                    LeaderboardView::Idle | LeaderboardView::Loading => "Loading...".to_string(),
                    LeaderboardView::Empty => "No scores yet".to_string(),
                    LeaderboardView::Failed(msg) => msg.clone(),
                    LeaderboardView::Loaded(entries) => entries
                        .iter()
                        .enumerate()
                        .map(|(i, e)| format!("{}. {} {} ({})", i + 1, e.username, e.score, e.difficulty))
                        .collect::<Vec<_>>()
                        .join("\n"),
                };
                self.set_text("leaderboard-list", &text);
            }
        }

        fn username_input(&self) -> Option<HtmlInputElement> {
            self.document
                .get_element_by_id("username")?
                .dyn_into::<HtmlInputElement>()
                .ok()
        }

        fn submit(&mut self) {
            let name = self
                .username_input()
                .map(|input| input.value())
                .unwrap_or_default();
            if let Err(e) = self.controller.submit_score(&name) {
                log::warn!("Submission refused: {}", e);
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("logger init failed: {e}").into());
        }

        log::info!("Flappy Kiro starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let settings = Settings::load();
        let controller = SessionController::new(
            &settings,
            Box::new(HttpLeaderboard::new(&settings)),
            Rc::new(LogSink),
        );

        let field = controller.playfield();
        canvas.set_width(field.width as u32);
        canvas.set_height(field.height as u32);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let game = Rc::new(RefCell::new(Game {
            controller,
            settings,
            ctx,
            document,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
            last_screen: None,
        }));

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_username_input(game.clone());

        request_animation_frame(game);

        log::info!("Flappy Kiro running!");
        Ok(())
    }

    fn on_click(game: &Rc<RefCell<Game>>, id: &str, action: impl Fn(&mut Game) + 'static) {
        let Some(btn) = game.borrow().document.get_element_by_id(id) else {
            log::warn!("Missing button #{}", id);
            return;
        };
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            action(&mut game.borrow_mut());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn log_refusal(result: Result<(), flappy_kiro::SessionError>) {
        if let Err(e) = result {
            log::warn!("{}", e);
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        for difficulty in Difficulty::ALL {
            on_click(&game, &format!("difficulty-{}", difficulty.as_str()), move |g| {
                log_refusal(g.controller.select_difficulty(difficulty));
                g.settings.difficulty = difficulty;
                g.settings.save();
            });
        }
        on_click(&game, "start-btn", |g| log_refusal(g.controller.start()));
        on_click(&game, "leave-btn", |g| log_refusal(g.controller.leave()));
        on_click(&game, "play-again-btn", |g| log_refusal(g.controller.play_again()));
        on_click(&game, "menu-btn", |g| log_refusal(g.controller.back_to_menu()));
        on_click(&game, "leaderboard-btn", |g| log_refusal(g.controller.show_leaderboard()));
        on_click(&game, "back-btn", |g| log_refusal(g.controller.back()));
        on_click(&game, "submit-btn", Game::submit);
    }

    fn setup_username_input(game: Rc<RefCell<Game>>) {
        let Some(input) = game.borrow().username_input() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            let value = g.username_input().map(|i| i.value()).unwrap_or_default();
            let message = match g.controller.set_username_input(&value) {
                Ok(()) => String::new(),
                Err(e) => e.to_string(),
            };
            g.set_text("username-error", &message);
        });
        let _ = input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse click - flap
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().controller.jump();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start - flap
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::TouchEvent| {
                event.prevent_default();
                game.borrow_mut().controller.jump();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match (g.controller.screen(), event.key().as_str()) {
                    (Screen::Playing, " " | "ArrowUp" | "w") => {
                        event.prevent_default();
                        g.controller.jump();
                    }
                    (Screen::Playing, "Escape") => log_refusal(g.controller.leave()),
                    (Screen::Menu, "Enter") => log_refusal(g.controller.start()),
                    (Screen::GameOver, "Enter") => g.submit(),
                    (Screen::Leaderboard, "Escape") => log_refusal(g.controller.back()),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            // Canvas keeps the last drawn frame while the engine is idle
            if g.controller.is_animating() {
                g.render();
            }
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flappy Kiro (native) starting...");
    log::info!("Native mode runs a headless autopilot - use `trunk serve` for the web version");

    if let Err(e) = demo::run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::RefCell;
    use std::rc::Rc;

    use flappy_kiro::events::LogSink;
    use flappy_kiro::leaderboard::MemoryLeaderboard;
    use flappy_kiro::session::{LeaderboardView, Screen, SessionController};
    use flappy_kiro::settings::Settings;
    use flappy_kiro::sim::Difficulty;
    use flappy_kiro::SessionError;

    const MAX_FRAMES: u32 = 20_000;
    const PLAYERS: [&str; 3] = ["kiro", "Player_1", "flapper-42"];

    /// Flap whenever the actor sinks below the next gap's centre
    fn autopilot(controller: &mut SessionController) {
        let Some(run) = controller.engine().and_then(|e| e.run()) else {
            return;
        };
        let field_height = controller.playfield().height;
        let target = run
            .obstacles
            .iter()
            .find(|w| w.trailing_edge() > run.actor.pos.x)
            .map(|w| (w.gap_top + w.gap_bottom) / 2.0)
            .unwrap_or(field_height / 2.0);
        if run.actor.bottom() > target + 20.0 && run.actor.vel > 0.0 {
            controller.jump();
        }
    }

    pub fn run() -> Result<(), SessionError> {
        let board = Rc::new(RefCell::new(MemoryLeaderboard::new()));
        let mut controller =
            SessionController::new(&Settings::load(), Box::new(board.clone()), Rc::new(LogSink));

        for difficulty in Difficulty::ALL {
            controller.select_difficulty(difficulty)?;
            for player in PLAYERS {
                if controller.screen() == Screen::GameOver {
                    controller.play_again()?;
                } else {
                    controller.start()?;
                }
                let mut frames = 0;
                while controller.screen() == Screen::Playing && frames < MAX_FRAMES {
                    autopilot(&mut controller);
                    controller.frame();
                    frames += 1;
                }
                if controller.screen() == Screen::Playing {
                    log::warn!("{} still alive after {} frames, leaving", player, frames);
                    controller.leave()?;
                    continue;
                }
                controller.submit_score(player)?;
                controller.frame();
                println!(
                    "{:<6} {:<12} {:>5}  {}",
                    difficulty.as_str(),
                    player,
                    controller.score(),
                    controller.status_message().unwrap_or("")
                );
            }
            if controller.screen() == Screen::GameOver {
                controller.back_to_menu()?;
            }
        }

        controller.show_leaderboard()?;
        controller.frame();
        if let LeaderboardView::Loaded(entries) = controller.leaderboard_view() {
            println!("\nTop {}:", entries.len());
            for (i, e) in entries.iter().enumerate() {
                println!("{:>3}. {:<12} {:>5} ({})", i + 1, e.username, e.score, e.difficulty);
            }
        }
        controller.back()?;

        let stats = board.borrow().stats();
        println!(
            "\n{} games, average {:.2}, best {}",
            stats.total_games, stats.average_score, stats.highest_score
        );
        for (difficulty, count) in &stats.difficulty_distribution {
            println!("  {difficulty}: {count}");
        }
        Ok(())
    }
}
