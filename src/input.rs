use crate::state::State;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton},
    keyboard::Key,
};

pub fn handle_zoom(state: &mut State, delta: f32) {
    // Zoom towards the window center if the cursor is outside
    let (x, y) = match state.cursor_pos {
        Some(pos) => (pos.x, pos.y),
        None => (state.size.width as f64 / 2.0, state.size.height as f64 / 2.0),
    };

    if state.view.zoom_at(x, y, delta > 0.0) {
        log::debug!("Cell size: {}, Offset: {:?}", state.view.cell_size, state.view.offset);
        state.engine.request_redraw();
    }
}

pub fn handle_mouse_input(state: &mut State, button: MouseButton, element_state: ElementState) {
    let is_pressed = element_state == ElementState::Pressed;
    match button {
        MouseButton::Left => {
            let cell = state
                .cursor_pos
                .map(|pos| state.view.screen_to_cell(pos.x, pos.y));
            if is_pressed {
                state.last_paint_cell = cell;
            } else if let Some(cell) = cell {
                // A click without movement still places its cell
                state.engine.paint(cell);
                state.last_paint_cell = None;
            }
            state.is_left_mouse_pressed = is_pressed;
        }
        MouseButton::Middle => {
            state.is_middle_mouse_pressed = is_pressed;
            state.last_mouse_pos = if is_pressed { state.cursor_pos } else { None };
        }
        _ => {}
    }
}

pub fn handle_cursor_move(state: &mut State, position: PhysicalPosition<f64>) {
    state.cursor_pos = Some(position);

    if state.is_middle_mouse_pressed {
        if let Some(last_pos) = state.last_mouse_pos {
            // The grid follows the cursor
            let dx = (position.x - last_pos.x).round() as i32;
            let dy = (position.y - last_pos.y).round() as i32;
            state.view.pan(dx, dy);
            state.engine.request_redraw();
        }
        state.last_mouse_pos = Some(position);
    }

    let cell = state.view.screen_to_cell(position.x, position.y);

    // Paint every cell between the previous and the current pointer cell
    if state.is_left_mouse_pressed {
        let from = state.last_paint_cell.unwrap_or(cell);
        state.engine.paint_line(from, cell);
        state.last_paint_cell = Some(cell);
    }

    if state.hover_cell != Some(cell) {
        state.hover_cell = Some(cell);
        state.engine.request_redraw();
    }
}

pub fn handle_cursor_left(state: &mut State) {
    state.cursor_pos = None;
    state.last_mouse_pos = None;
    state.hover_cell = None;
    state.engine.request_redraw();
}

pub fn handle_key(state: &mut State, event: &KeyEvent) {
    if event.state != ElementState::Released {
        return;
    }
    if let Key::Character(text) = &event.logical_key {
        match text.as_str() {
            "p" | "P" => {
                state.engine.toggle_pause();
            }
            "r" | "R" => {
                if state.engine.request_restart() {
                    state.view.reset();
                }
            }
            _ => {}
        }
    }
}
