use dioxus::prelude::*;
use relief_shared::collab::NoticeKind;

use crate::notify::Toast;

#[component]
pub fn ToastList(toasts: Signal<Vec<Toast>>) -> Element {
    rsx! {
        div { class: "toasts", "aria-live": "polite",
            for toast in toasts.read().iter().cloned() {
                div {
                    key: "{toast.id}",
                    class: match toast.kind {
                        NoticeKind::Success => "toast toast-success",
                        NoticeKind::Error => "toast toast-error",
                    },
                    span { "{toast.message}" }
                    button {
                        class: "toast-close",
                        "aria-label": "Dismiss",
                        onclick: {
                            let id = toast.id;
                            move |_| {
                                let mut toasts = toasts;
                                toasts.write().retain(|t| t.id != id);
                            }
                        },
                        "×"
                    }
                }
            }
        }
    }
}
