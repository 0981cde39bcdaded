#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Gps,
    Video,
    HeartRate,
    Comparison,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Home,
        Screen::Gps,
        Screen::Video,
        Screen::HeartRate,
        Screen::Comparison,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Home => "Accueil",
            Screen::Gps => "Analyse GPS",
            Screen::Video => "Analyse vidéo",
            Screen::HeartRate => "Récupération cardiaque",
            Screen::Comparison => "Comparaison",
        }
    }

    /// Digit key that opens the screen.
    pub fn hotkey(self) -> char {
        match self {
            Screen::Home => '1',
            Screen::Gps => '2',
            Screen::Video => '3',
            Screen::HeartRate => '4',
            Screen::Comparison => '5',
        }
    }

    pub fn from_hotkey(c: char) -> Option<Self> {
        Screen::ALL.into_iter().find(|s| s.hotkey() == c)
    }

    fn index(self) -> usize {
        Screen::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    Open(Screen),
    Back,
    Next,
    Prev,
}

/// Screen shown after `event`. Back always returns home.
pub fn next_screen(current: Screen, event: NavEvent) -> Screen {
    let n = Screen::ALL.len();
    match event {
        NavEvent::Open(target) => target,
        NavEvent::Back => Screen::Home,
        NavEvent::Next => Screen::ALL[(current.index() + 1) % n],
        NavEvent::Prev => Screen::ALL[(current.index() + n - 1) % n],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_returns_home_from_anywhere() {
        for screen in Screen::ALL {
            assert_eq!(next_screen(screen, NavEvent::Back), Screen::Home);
        }
    }

    #[test]
    fn next_and_prev_wrap() {
        assert_eq!(next_screen(Screen::Comparison, NavEvent::Next), Screen::Home);
        assert_eq!(next_screen(Screen::Home, NavEvent::Prev), Screen::Comparison);
        assert_eq!(next_screen(Screen::Gps, NavEvent::Next), Screen::Video);
    }

    #[test]
    fn hotkeys_are_unique() {
        for screen in Screen::ALL {
            assert_eq!(Screen::from_hotkey(screen.hotkey()), Some(screen));
        }
        assert_eq!(Screen::from_hotkey('9'), None);
    }
}
