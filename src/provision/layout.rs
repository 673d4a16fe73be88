use crate::models::CanvasPosition;

const ORIGIN_X: i32 = -825;
const ORIGIN_Y: i32 = -375;
const STEP_X: i32 = 150;
const ROW_HEIGHT: i32 = 200;
const NODES_PER_ROW: usize = 9;

/// Grid position of the `index`th node: left to right, then a new row
pub fn canvas_position(index: usize) -> CanvasPosition {
    let column = (index % NODES_PER_ROW) as i32;
    let row = (index / NODES_PER_ROW) as i32;
    CanvasPosition {
        x: ORIGIN_X + column * STEP_X,
        y: ORIGIN_Y + row * ROW_HEIGHT,
    }
}
