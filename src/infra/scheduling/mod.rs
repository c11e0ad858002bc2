pub mod http_calendar_service;
pub mod http_meeting_service;
