mod test_relay_loop;
