use std::ffi::c_int;

use sdl2_sys::SDL_KeyCode;

const SDLK_RETURN: c_int = SDL_KeyCode::SDLK_RETURN as c_int;
const SDLK_ESCAPE: c_int = SDL_KeyCode::SDLK_ESCAPE as c_int;
const SDLK_SPACE: c_int = SDL_KeyCode::SDLK_SPACE as c_int;
const SDLK_Q: c_int = SDL_KeyCode::SDLK_q as c_int;
const SDLK_RIGHT: c_int = SDL_KeyCode::SDLK_RIGHT as c_int;
const SDLK_LEFT: c_int = SDL_KeyCode::SDLK_LEFT as c_int;
const SDLK_DOWN: c_int = SDL_KeyCode::SDLK_DOWN as c_int;
const SDLK_UP: c_int = SDL_KeyCode::SDLK_UP as c_int;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Return,
    Escape,
    Space,
    Q,
    Right,
    Left,
    Down,
    Up,
    Other(c_int),
}

impl Key {
    pub fn from_keycode(code: c_int) -> Self {
        match code {
            SDLK_RETURN => Self::Return,
            SDLK_ESCAPE => Self::Escape,
            SDLK_SPACE => Self::Space,
            SDLK_Q => Self::Q,
            SDLK_RIGHT => Self::Right,
            SDLK_LEFT => Self::Left,
            SDLK_DOWN => Self::Down,
            SDLK_UP => Self::Up,
            other => Self::Other(other),
        }
    }
}
