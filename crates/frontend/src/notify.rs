use std::cell::Cell;
use std::rc::Rc;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use relief_shared::collab::{NoticeKind, Notifier};

const TOAST_LIFETIME_MS: u32 = 4000;
const MAX_TOASTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
}

/// Hands out toast ids that are never reused, even once every toast is gone.
#[derive(Debug, Default)]
pub struct ToastIds(Cell<u64>);

impl ToastIds {
    pub fn next(&self) -> u64 {
        let id = self.0.get() + 1;
        self.0.set(id);
        id
    }
}

/// Append a toast, dropping the oldest beyond `limit`.
pub fn push_toast(toasts: &mut Vec<Toast>, toast: Toast, limit: usize) {
    toasts.push(toast);
    if toasts.len() > limit {
        let excess = toasts.len() - limit;
        toasts.drain(..excess);
    }
}

/// Shows notices as toasts that dismiss themselves.
#[derive(Clone)]
pub struct ToastNotifier {
    toasts: Signal<Vec<Toast>>,
    ids: Rc<ToastIds>,
}

impl ToastNotifier {
    pub fn new(toasts: Signal<Vec<Toast>>) -> Self {
        ToastNotifier {
            toasts,
            ids: Rc::new(ToastIds::default()),
        }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        let mut toasts = self.toasts;
        let id = self.ids.next();
        let toast = Toast {
            id,
            kind,
            message: message.to_string(),
        };
        push_toast(&mut toasts.write(), toast, MAX_TOASTS);
        spawn(async move {
            TimeoutFuture::new(TOAST_LIFETIME_MS).await;
            toasts.write().retain(|t| t.id != id);
        });
    }
}
