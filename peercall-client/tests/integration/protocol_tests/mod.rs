mod test_malformed_messages;
mod test_send_failures;
