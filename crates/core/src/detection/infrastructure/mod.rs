pub mod scripted_detection_engine;
