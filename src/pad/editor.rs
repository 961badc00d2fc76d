//! Source editor — line buffer with a character-indexed cursor.

#[derive(Debug, Clone)]
pub struct Editor {
    lines: Vec<String>,
    row: usize,
    /// Column in characters, not bytes.
    col: usize,
    scroll_offset: usize,
    viewport_height: usize,
}

impl Editor {
    pub fn new(content: &str) -> Self {
        Self {
            lines: split_lines(content),
            row: 0,
            col: 0,
            scroll_offset: 0,
            viewport_height: 20,
        }
    }

    /// Full text, lines joined by `\n`.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Cursor as (row, col).
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// First visible line.
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.scroll_to_cursor();
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    /// Split the current line at the cursor.
    pub fn newline(&mut self) {
        let at = self.byte_index();
        let rest = self.lines[self.row].split_off(at);
        self.row += 1;
        self.lines.insert(self.row, rest);
        self.col = 0;
        self.scroll_to_cursor();
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let at = self.byte_index();
            self.lines[self.row].remove(at);
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len();
            self.lines[self.row].push_str(&line);
            self.scroll_to_cursor();
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_len() {
            let at = self.byte_index();
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len();
            self.scroll_to_cursor();
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
            self.scroll_to_cursor();
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len());
            self.scroll_to_cursor();
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len());
            self.scroll_to_cursor();
        }
    }

    pub fn home(&mut self) {
        self.col = 0;
    }

    pub fn end(&mut self) {
        self.col = self.line_len();
    }

    /// Replace the whole buffer and reset the cursor.
    pub fn set_content(&mut self, content: &str) {
        self.lines = split_lines(content);
        self.row = 0;
        self.col = 0;
        self.scroll_offset = 0;
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_len(&self) -> usize {
        self.lines[self.row].chars().count()
    }

    fn byte_index(&self) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(self.col)
            .map_or(line.len(), |(i, _)| i)
    }

    fn scroll_to_cursor(&mut self) {
        if self.row < self.scroll_offset {
            self.scroll_offset = self.row;
        } else if self.row >= self.scroll_offset + self.viewport_height {
            self.scroll_offset = self.row + 1 - self.viewport_height;
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new("")
    }
}

fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(str::to_string).collect()
}
