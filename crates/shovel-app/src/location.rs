//! Navigable location with browser-style history
//!
//! The current URL is the single store of the filter and of the selected
//! flow. `push` records a new entry; `back`/`forward` move through history
//! the way the browser's buttons do.

use url::Url;

#[derive(Debug, Clone)]
pub struct Location {
    current: Url,
    back: Vec<Url>,
    forward: Vec<Url>,
}

impl Location {
    pub fn new(url: Url) -> Self {
        Self {
            current: url,
            back: Vec::new(),
            forward: Vec::new(),
        }
    }

    pub fn current(&self) -> &Url {
        &self.current
    }

    /// Navigate to `url`, dropping the forward history.
    pub fn push(&mut self, url: Url) {
        let previous = std::mem::replace(&mut self.current, url);
        self.back.push(previous);
        self.forward.clear();
    }

    /// Go one entry back. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        match self.back.pop() {
            Some(url) => {
                let previous = std::mem::replace(&mut self.current, url);
                self.forward.push(previous);
                true
            }
            None => false,
        }
    }

    /// Go one entry forward. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        match self.forward.pop() {
            Some(url) => {
                let previous = std::mem::replace(&mut self.current, url);
                self.back.push(previous);
                true
            }
            None => false,
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(query: &str) -> Url {
        Url::parse(&format!("http://shovel.local/?{query}")).unwrap()
    }

    #[test]
    fn test_push_back_forward() {
        let mut location = Location::new(url("a=1"));
        location.push(url("a=2"));
        location.push(url("a=3"));

        assert!(location.back());
        assert_eq!(location.current(), &url("a=2"));
        assert!(location.back());
        assert_eq!(location.current(), &url("a=1"));
        assert!(!location.back());

        assert!(location.forward());
        assert_eq!(location.current(), &url("a=2"));
    }

    #[test]
    fn test_push_clears_forward_history() {
        let mut location = Location::new(url("a=1"));
        location.push(url("a=2"));
        location.back();
        assert!(location.can_go_forward());

        location.push(url("a=9"));
        assert!(!location.can_go_forward());
        assert!(!location.forward());
        assert_eq!(location.current(), &url("a=9"));
        assert!(location.can_go_back());
    }
}
