use once_cell::sync::Lazy;
use serde_json::{Value, json};

/// Default theme of the mini preset.
pub static THEME: Lazy<Value> = Lazy::new(|| {
    json!({
        "colors": {
            "transparent": "transparent",
            "current": "currentColor",
            "white": "#ffffff",
            "black": "#000000",
            "gray": {
                "100": "#f3f4f6",
                "300": "#d1d5db",
                "500": "#6b7280",
                "700": "#374151",
                "900": "#111827",
                "DEFAULT": "#6b7280"
            },
            "red": {
                "100": "#fee2e2",
                "300": "#fca5a5",
                "500": "#ef4444",
                "700": "#b91c1c",
                "900": "#7f1d1d",
                "DEFAULT": "#ef4444"
            },
            "green": {
                "100": "#dcfce7",
                "300": "#86efac",
                "500": "#22c55e",
                "700": "#15803d",
                "900": "#14532d",
                "DEFAULT": "#22c55e"
            },
            "blue": {
                "100": "#dbeafe",
                "300": "#93c5fd",
                "500": "#3b82f6",
                "700": "#1d4ed8",
                "900": "#1e3a8a",
                "DEFAULT": "#3b82f6"
            },
            "light-blue": {
                "500": "#0ea5e9",
                "DEFAULT": "#0ea5e9"
            }
        },
        "spacing": {
            "px": "1px",
            "full": "100%"
        },
        "breakpoints": {
            "sm": "640px",
            "md": "768px",
            "lg": "1024px",
            "xl": "1280px"
        },
        "containers": {
            "xs": "20rem",
            "sm": "24rem",
            "md": "28rem",
            "lg": "32rem"
        }
    })
});
