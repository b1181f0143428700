//! Browser leaderboard transport (fetch API)
//!
//! Requests run on the JS event loop via `spawn_local`; finished calls land
//! in a shared inbox that `poll()` drains from the frame callback.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::error::TransportError;
use crate::leaderboard::{
    LeaderboardEntry, LeaderboardReply, LeaderboardService, ScoreSubmission, SubmitReceipt,
};
use crate::settings::Settings;

type Inbox = Rc<RefCell<VecDeque<LeaderboardReply>>>;

/// `{"error": "..."}` body returned on 4xx/5xx
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct SubmitBody {
    #[serde(default)]
    rank: usize,
}

pub struct HttpLeaderboard {
    scores_url: String,
    leaderboard_url: String,
    inbox: Inbox,
}

impl HttpLeaderboard {
    pub fn new(settings: &Settings) -> Self {
        Self {
            scores_url: settings.scores_url(),
            leaderboard_url: settings.leaderboard_url(),
            inbox: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl LeaderboardService for HttpLeaderboard {
    fn submit_score(&mut self, submission: ScoreSubmission) {
        let url = self.scores_url.clone();
        let inbox = self.inbox.clone();
        spawn_local(async move {
            let result = match serde_json::to_string(&submission) {
                Ok(body) => request("POST", &url, Some(&body))
                    .await
                    .and_then(|text| parse::<SubmitBody>(&text))
                    .map(|b| SubmitReceipt { rank: b.rank }),
                Err(e) => Err(TransportError::new(e.to_string())),
            };
            inbox.borrow_mut().push_back(LeaderboardReply::Submitted(result));
        });
    }

    fn fetch_leaderboard(&mut self) {
        let url = self.leaderboard_url.clone();
        let inbox = self.inbox.clone();
        spawn_local(async move {
            let result = request("GET", &url, None)
                .await
                .and_then(|text| parse::<Vec<LeaderboardEntry>>(&text));
            inbox.borrow_mut().push_back(LeaderboardReply::Fetched(result));
        });
    }

    fn poll(&mut self) -> Option<LeaderboardReply> {
        self.inbox.borrow_mut().pop_front()
    }
}

fn js_error(value: JsValue) -> TransportError {
    let message = value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"));
    log::warn!("Leaderboard request failed: {}", message);
    TransportError::new("Network error")
}

fn parse<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, TransportError> {
    serde_json::from_str(text).map_err(|e| TransportError::new(format!("Malformed response: {e}")))
}

/// Issue a JSON request and return the body of a 2xx response
async fn request(method: &str, url: &str, body: Option<&str>) -> Result<String, TransportError> {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(url, &opts).map_err(js_error)?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_error)?;
    }

    let window = web_sys::window().ok_or_else(|| TransportError::new("no window"))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let response: Response = value.dyn_into().map_err(js_error)?;

    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .unwrap_or_default();

    if response.ok() {
        Ok(text)
    } else {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("HTTP {}", response.status()));
        Err(TransportError::new(message))
    }
}
