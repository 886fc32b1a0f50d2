//! tatami :: a tag-based tiling window manager for X11
use std::{collections::HashMap, env, process::exit};
use tatami::{
    builtin::actions::{
        drag_move, drag_resize, focus_monitor, focus_stack, inc_nmaster, kill_focused, move_stack,
        quit, set_layout, set_mfact, spawn, swap_focus, tag, tag_monitor, toggle_bar,
        toggle_floating, toggle_fullscreen, toggle_tag, toggle_view, view, view_previous, zoom,
    },
    core::{
        bindings::{
            parse_keybindings_with_xmodmap, KeyEventHandler, ModifierKey, MouseBindings,
            MouseButton, MouseState,
        },
        Config, Rule, WindowManager,
    },
    map,
    pure::TagMask,
    x11rb::RustConn,
    Result,
};
use tracing_subscriber::{prelude::*, EnvFilter};

const USAGE: &str = "usage: tatami [-v]";

fn key_bindings() -> HashMap<String, Box<dyn KeyEventHandler<RustConn>>> {
    let mut bindings: HashMap<String, Box<dyn KeyEventHandler<RustConn>>> = map! {
        map_keys: |s: &str| s.to_owned();

        "M-j" => focus_stack(1),
        "M-k" => focus_stack(-1),
        "M-S-j" => move_stack(1),
        "M-S-k" => move_stack(-1),
        "M-h" => set_mfact(-0.05),
        "M-l" => set_mfact(0.05),
        "M-i" => inc_nmaster(1),
        "M-d" => inc_nmaster(-1),
        "M-Return" => zoom(),
        "M-Tab" => view_previous(),
        "M-o" => swap_focus(),
        "M-t" => set_layout(0),
        "M-m" => set_layout(1),
        "M-f" => set_layout(2),
        "M-b" => toggle_bar(),
        "M-S-space" => toggle_floating(),
        "M-S-f" => toggle_fullscreen(),
        "M-comma" => focus_monitor(-1),
        "M-period" => focus_monitor(1),
        "M-S-comma" => tag_monitor(-1),
        "M-S-period" => tag_monitor(1),
        "M-S-c" => kill_focused(),
        "M-p" => spawn("dmenu_run"),
        "M-S-Return" => spawn("xterm"),
        "M-S-q" => quit(),
    };

    for n in 1..=9usize {
        let mask = TagMask::from_index(n - 1);
        bindings.insert(format!("M-{n}"), view(mask));
        bindings.insert(format!("M-S-{n}"), tag(mask));
        bindings.insert(format!("M-C-{n}"), toggle_view(mask));
        bindings.insert(format!("M-C-S-{n}"), toggle_tag(mask));
    }

    bindings
}

fn mouse_bindings() -> MouseBindings<RustConn> {
    let mut bindings: MouseBindings<RustConn> = HashMap::new();
    bindings.insert(
        MouseState::new(MouseButton::Left, vec![ModifierKey::Meta]),
        drag_move(),
    );
    bindings.insert(
        MouseState::new(MouseButton::Right, vec![ModifierKey::Meta]),
        drag_resize(),
    );

    bindings
}

fn config() -> Config<RustConn> {
    Config {
        rules: vec![Rule {
            class: Some("Gimp".to_owned()),
            instance: None,
            title: None,
            tags: TagMask::EMPTY,
            floating: true,
            monitor: None,
            obeys_size_hints: true,
        }],
        ..Config::default()
    }
}

fn run() -> Result<()> {
    let conn = RustConn::new()?;
    let key_bindings = parse_keybindings_with_xmodmap(key_bindings())?;
    let wm = WindowManager::new(config(), key_bindings, mouse_bindings(), conn)?;

    wm.run()
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => (),
        [v] if v == "-v" => {
            println!("tatami-{}", env!("CARGO_PKG_VERSION"));
            exit(0);
        }
        _ => {
            eprintln!("{USAGE}");
            exit(1);
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("tatami: {e}");
        exit(1);
    }
}
