//! End-to-end tests over a real WebSocket feed and HTTP backend.

mod live_feed;
