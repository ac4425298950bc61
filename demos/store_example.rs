//! Store example with a connected view

use datastore::{Connected, DataStore, StateMap};
use serde_json::{json, Value};

fn active_todos(state: &StateMap) -> usize {
    state["todos"]
        .as_array()
        .map(|todos| {
            todos
                .iter()
                .filter(|t| t["completed"] == Value::Bool(false))
                .count()
        })
        .unwrap_or(0)
}

fn main() {
    println!("=== Store Example ===\n");

    // Create a store with initial state
    let store = DataStore::new(json!({
        "todos": [],
        "filter": "all",
    }));

    // Watch state changes
    let reader = store.clone();
    let handle = store.watch("stateChanged", move || {
        println!("State updated! Active todos: {}", active_todos(&reader.get_state()));
    });

    // A view that re-renders on demand
    let mut view = Connected::new(&store, |state: &StateMap| {
        format!("[{}] {} active", state["filter"], active_todos(state))
    });
    println!("Initial view: {}", view.render());

    // Add a todo
    println!("\nAdding todo...");
    store.set_state(json!({
        "todos": [{ "id": 1, "text": "Learn datastore", "completed": false }],
    }));

    // Complete the todo
    println!("\nCompleting todo...");
    store.set_state(json!({
        "todos": [{ "id": 1, "text": "Learn datastore", "completed": true }],
        "filter": "done",
    }));

    if let Some(output) = view.render_if_needed() {
        println!("\nView re-rendered: {output}");
    }

    // Arrays are not valid updates and are ignored
    let accepted = store.set_state(json!(["not", "an", "object"]));
    println!("\nArray update accepted: {accepted}");

    store.unwatch(&handle);

    // Read final state
    println!("\nFinal state: {:#?}", store.get_state());
}
