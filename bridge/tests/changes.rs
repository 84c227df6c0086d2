use pe_bridge::ChangeQueue;
use pe_core::{DocumentCommands, DocumentQuery, EditorCommand, PostEditor, Selection, ToolbarAction};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn changes_wait_until_the_editor_is_released() {
    let post = Rc::new(RefCell::new(PostEditor::from_html("<p>Hi</p>")));
    let changes = ChangeQueue::new();
    post.borrow_mut().set_on_change(changes.sink());

    {
        let mut editor = post.borrow_mut();
        editor.set_selection(Selection::collapsed(2));
        assert!(editor.execute(EditorCommand::InsertText("!".into())));
    }
    assert!(!changes.is_empty());

    // the callback reads and edits the editor, as a host listener may
    let mut seen = Vec::new();
    changes.drain(|html| {
        assert_eq!(post.borrow().html(), html);
        if seen.is_empty() {
            post.borrow_mut().perform(ToolbarAction::Undo);
        }
        seen.push(html);
    });
    assert_eq!(seen, vec!["<p>Hi!</p>".to_string(), "<p>Hi</p>".to_string()]);
    assert!(changes.is_empty());
    assert!(post.borrow().can_redo());
}

#[test]
fn draining_an_empty_queue_delivers_nothing() {
    let changes = ChangeQueue::new();
    let mut calls = 0;
    changes.drain(|_| calls += 1);
    assert_eq!(calls, 0);
}
