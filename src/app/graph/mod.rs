mod interaction;
mod view;

pub(in crate::app) use self::interaction::{
    InteractionController, PointerEvent, SelectionState, hit_test,
};
