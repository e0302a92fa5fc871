pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod log_throttle;
    pub mod pipeline_settings;
    pub mod rect;
}

pub mod capture {
    pub mod domain {
        pub mod camera_error;
        pub mod capture_backend;
        pub mod capture_device;
        pub mod format_selector;
        pub mod frame_sink;
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detection_engine;
        pub mod detection_outcome;
        pub mod engine_error;
        pub mod face_landmarks;
        pub mod face_region;
    }
    pub mod infrastructure;
}

pub mod tracking {
    pub mod domain {
        pub mod detection_state_tracker;
    }
}

pub mod overlay {
    pub mod domain {
        pub mod coordinate_transformer;
        pub mod overlay_renderer;
        pub mod overlay_surface;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod frame_observer;
    pub mod frame_pipeline;
    pub mod live_session;
    pub mod manage_identities_use_case;
    pub mod mode_controller;
    pub mod modes {
        pub mod enroll_mode;
        pub mod object_tag_mode;
        pub mod recognize_mode;
        pub mod spoof_check_mode;
    }
    pub mod pipeline_logger;
    pub mod ui_context;
    pub mod ui_state;
}
